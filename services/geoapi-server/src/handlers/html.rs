//! Minimal HTML rendering of the API documents.

use geoapi_protocol::{Collection, CollectionList, ConformanceClasses, LandingPage, Link};

/// Escape text for use in HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n<h1>{}</h1>\n{}</body>\n</html>\n",
        escape(title),
        escape(title),
        body
    )
}

fn link_list(links: &[Link]) -> String {
    let mut html = String::from("<ul>\n");
    for link in links.iter().filter(|l| l.rel != "self") {
        let label = link.title.as_deref().unwrap_or(&link.href);
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape(&link.href),
            escape(label)
        ));
    }
    html.push_str("</ul>\n");
    html
}

pub fn landing_page(landing: &LandingPage) -> String {
    let mut body = String::new();
    if let Some(description) = &landing.description {
        body.push_str(&format!("<p>{}</p>\n", escape(description)));
    }
    body.push_str(&link_list(&landing.links));
    page(&landing.title, &body)
}

pub fn conformance(classes: &ConformanceClasses) -> String {
    let mut body = String::from("<ul>\n");
    for class in &classes.conforms_to {
        body.push_str(&format!("<li>{}</li>\n", escape(class)));
    }
    body.push_str("</ul>\n");
    page("Conformance", &body)
}

pub fn collections(list: &CollectionList) -> String {
    let mut body = String::from("<ul>\n");
    for collection in &list.collections {
        let href = collection
            .links
            .iter()
            .find(|l| l.type_.as_deref() == Some("text/html"))
            .map(|l| l.href.as_str())
            .unwrap_or_default();
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape(href),
            escape(collection.title.as_deref().unwrap_or(&collection.id))
        ));
    }
    body.push_str("</ul>\n");
    page("Collections", &body)
}

pub fn collection(collection: &Collection) -> String {
    let mut body = String::new();
    if let Some(description) = &collection.description {
        body.push_str(&format!("<p>{}</p>\n", escape(description)));
    }
    if !collection.keywords.is_empty() {
        let keywords: Vec<String> = collection.keywords.iter().map(|k| escape(k)).collect();
        body.push_str(&format!("<p>Keywords: {}</p>\n", keywords.join(", ")));
    }
    body.push_str(&link_list(&collection.links));
    page(collection.title.as_deref().unwrap_or(&collection.id), &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<a href=\"x\">Tom & Jerry's</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_landing_page_escapes_title() {
        let landing = LandingPage::new("<geoapi>", "Lakes & rivers", "http://localhost:5000");
        let html = landing_page(&landing);

        assert!(html.contains("<title>&lt;geoapi&gt;</title>"));
        assert!(html.contains("<p>Lakes &amp; rivers</p>"));
        assert!(html.contains("href=\"http://localhost:5000/conformance\""));
    }

    #[test]
    fn test_collection_page_skips_self_link() {
        let lakes = Collection::new("lakes")
            .with_title("Large Lakes")
            .with_link(Link::new("http://localhost/collections/lakes?f=html", "self"))
            .with_link(
                Link::new("http://localhost/collections/lakes?f=json", "alternate")
                    .with_title("JSON"),
            );
        let html = collection(&lakes);

        assert!(html.contains("<h1>Large Lakes</h1>"));
        assert!(!html.contains("f=html"));
        assert!(html.contains("f=json"));
    }
}
