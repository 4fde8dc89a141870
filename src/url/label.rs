use url::Url;

/// Derives a category label from its listing URL
///
/// The last non-empty path segment is split on `-` and every word is
/// capitalized: `/chocolate-y-dulces/` becomes `Chocolate Y Dulces`.
/// Falls back to `Categoria` when the URL has no usable segment.
pub fn category_label(listing_url: &str) -> String {
    let segment = Url::parse(listing_url).ok().and_then(|url| {
        url.path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
    });

    match segment {
        Some(segment) => segment
            .split('-')
            .filter(|word| !word.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
        None => "Categoria".to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turns a label into a lower-case file stem: `Té e Infusiones` -> `te_e_infusiones`
pub fn file_stem(label: &str) -> String {
    let mut stem = String::with_capacity(label.len());
    for c in label.chars().map(fold_diacritic) {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }

    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "leads".to_string()
    } else {
        stem.to_string()
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'Á' | 'À' | 'Â' | 'Ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        other => other,
    }
}
