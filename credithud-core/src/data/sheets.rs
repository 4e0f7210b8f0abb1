//! Google Sheets link handling.
//!
//! Spreadsheet links are usually copied from the browser address bar
//! (`.../spreadsheets/d/{id}/edit?gid=0#gid=0`), which serves HTML. Those
//! are rewritten to the CSV export endpoint. Export links, published links
//! (`/d/e/{id}/pub`) and everything else pass through unchanged.

use reqwest::Url;

const SHEETS_HOST: &str = "docs.google.com";

/// CSV export URL for a Sheets editor/viewer link, or `location` unchanged.
pub fn export_url(location: &str) -> String {
    let Ok(url) = Url::parse(location) else {
        return location.to_string();
    };
    if url.host_str() != Some(SHEETS_HOST) {
        return location.to_string();
    }

    let segments: Vec<&str> = match url.path_segments() {
        Some(s) => s.filter(|s| !s.is_empty()).collect(),
        None => return location.to_string(),
    };

    let id = match segments.as_slice() {
        ["spreadsheets", "d", id] => *id,
        ["spreadsheets", "d", id, "edit" | "view"] => *id,
        _ => return location.to_string(),
    };
    if id == "e" {
        return location.to_string();
    }

    let gid = sheet_gid(&url).unwrap_or_else(|| "0".to_string());
    format!("https://{SHEETS_HOST}/spreadsheets/d/{id}/export?format=csv&gid={gid}")
}

/// `gid` from the query string, falling back to the `#gid=` fragment.
fn sheet_gid(url: &Url) -> Option<String> {
    let from_query = url
        .query_pairs()
        .find(|(k, _)| k == "gid")
        .map(|(_, v)| v.into_owned());

    from_query
        .or_else(|| {
            url.fragment()
                .and_then(|f| f.split('&').find_map(|p| p.strip_prefix("gid=")))
                .map(String::from)
        })
        .filter(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_editor_link() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc123/edit?gid=0#gid=0"),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=0"
        );
    }

    #[test]
    fn keeps_non_default_gid_from_fragment() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc123/edit#gid=42"),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=42"
        );
    }

    #[test]
    fn bare_document_link_defaults_to_first_sheet() {
        assert_eq!(
            export_url("https://docs.google.com/spreadsheets/d/abc123"),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=0"
        );
    }

    #[test]
    fn export_and_published_links_pass_through() {
        let export = "https://docs.google.com/spreadsheets/d/abc123/export?format=csv&gid=7";
        assert_eq!(export_url(export), export);

        let published = "https://docs.google.com/spreadsheets/d/e/2PACX-xyz/pub?output=csv";
        assert_eq!(export_url(published), published);
    }

    #[test]
    fn other_locations_pass_through() {
        assert_eq!(
            export_url("https://example.com/data.csv"),
            "https://example.com/data.csv"
        );
        assert_eq!(export_url("data/operations.csv"), "data/operations.csv");
    }
}
