use url::Url;

/// Builds the URL of listing page `page` for a category
///
/// Page 1 is the listing URL itself. Later pages carry a `page=N` query
/// parameter; an existing `page` parameter is replaced and any other query
/// parameters are kept in place.
///
/// # Examples
///
/// ```
/// use lead_harvest::url::page_url;
///
/// let url = page_url("https://www.proveedores.com/miel/", 3).unwrap();
/// assert_eq!(url, "https://www.proveedores.com/miel/?page=3");
/// ```
pub fn page_url(listing_url: &str, page: u32) -> Result<String, url::ParseError> {
    let mut url = Url::parse(listing_url)?;
    if page <= 1 {
        return Ok(url.to_string());
    }

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (key, value) in &retained {
            pairs.append_pair(key, value);
        }
        pairs.append_pair("page", &page.to_string());
    }

    Ok(url.to_string())
}
