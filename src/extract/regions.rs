/// Spanish provinces in match priority order
///
/// An entry that contains another entry as a substring must come first,
/// otherwise the shorter name would always win.
pub const REGIONS: &[&str] = &[
    "A Coruña",
    "Álava",
    "Albacete",
    "Alicante",
    "Almería",
    "Asturias",
    "Ávila",
    "Badajoz",
    "Barcelona",
    "Burgos",
    "Cáceres",
    "Cádiz",
    "Cantabria",
    "Castellón",
    "Ceuta",
    "Ciudad Real",
    "Córdoba",
    "Cuenca",
    "Girona",
    "Granada",
    "Guadalajara",
    "Guipúzcoa",
    "Gipuzkoa",
    "Huelva",
    "Huesca",
    "Islas Baleares",
    "Baleares",
    "Jaén",
    "La Rioja",
    "Las Palmas",
    "León",
    "Lleida",
    "Lérida",
    "Lugo",
    "Madrid",
    "Málaga",
    "Melilla",
    "Murcia",
    "Navarra",
    "Ourense",
    "Orense",
    "Palencia",
    "Pontevedra",
    "Salamanca",
    "Santa Cruz de Tenerife",
    "Tenerife",
    "Segovia",
    "Sevilla",
    "Soria",
    "Tarragona",
    "Teruel",
    "Toledo",
    "Valencia",
    "Valladolid",
    "Vizcaya",
    "Bizkaia",
    "Zamora",
    "Zaragoza",
];

/// First region of the priority list mentioned anywhere in `text`
///
/// The result depends only on which names occur, not on where they occur.
pub fn find_region(text: &str) -> Option<&'static str> {
    REGIONS.iter().copied().find(|region| text.contains(region))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_region() {
        assert_eq!(find_region("Polígono Industrial, Zaragoza (España)"), Some("Zaragoza"));
        assert_eq!(find_region("sin ubicación"), None);
    }

    #[test]
    fn test_qualified_name_wins_over_substring() {
        assert_eq!(
            find_region("Oficinas en Santa Cruz de Tenerife"),
            Some("Santa Cruz de Tenerife")
        );
        assert_eq!(find_region("Sede: Islas Baleares"), Some("Islas Baleares"));
        assert_eq!(find_region("Sede: Baleares"), Some("Baleares"));
    }

    #[test]
    fn test_priority_independent_of_text_order() {
        let forward = find_region("Almacén en Madrid, oficina en Barcelona");
        let backward = find_region("Oficina en Barcelona, almacén en Madrid");
        assert_eq!(forward, Some("Barcelona"));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_regional_aliases() {
        assert_eq!(find_region("Donostia, Gipuzkoa"), Some("Gipuzkoa"));
        assert_eq!(find_region("Bilbao, Bizkaia"), Some("Bizkaia"));
        assert_eq!(find_region("Lérida"), Some("Lérida"));
        assert_eq!(find_region("Orense"), Some("Orense"));
    }

    #[test]
    fn test_longer_entries_precede_their_substrings() {
        for (i, longer) in REGIONS.iter().enumerate() {
            for shorter in &REGIONS[..i] {
                assert!(
                    !longer.contains(shorter),
                    "{} must be listed before {}",
                    longer,
                    shorter
                );
            }
        }
    }
}
