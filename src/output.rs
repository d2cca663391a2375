// output formatting - readable records or raw json

use crate::agent::Response;
use crate::core::{Lookup, SpeciesRecord};

pub struct Output;

impl Output {
    // nice format for humans
    pub fn pretty(lookup: &Lookup) {
        print!("{}", render(lookup));
    }

    // raw json for scripts
    pub fn raw(lookup: &Lookup) {
        println!("{}", serde_json::to_string_pretty(lookup).unwrap_or_default());
    }

    pub fn messages(messages: &[Response]) {
        for message in messages {
            println!("{}", render_message(message));
        }
    }
}

pub fn render(lookup: &Lookup) -> String {
    let mut out = format!("query: {}\n", lookup.query);
    out.push_str(&format!("search: {}\n", lookup.search_url));
    out.push_str(&format!("matches: {}\n", lookup.total_found));

    if lookup.records.is_empty() {
        out.push_str(&format!("\nno plants found matching {}\n", lookup.query));
        return out;
    }

    for record in &lookup.records {
        out.push('\n');
        out.push_str(&render_record(record));
    }

    out
}

fn render_record(record: &SpeciesRecord) -> String {
    let mut out = String::new();

    match &record.authors {
        Some(authors) => out.push_str(&format!("{} {}\n", record.accepted_name, authors)),
        None => out.push_str(&format!("{}\n", record.accepted_name)),
    }

    field(&mut out, "id", Some(&record.fq_id));
    field(&mut out, "family", record.family.as_ref());
    field(&mut out, "rank", record.rank.as_ref());
    field(&mut out, "status", record.taxonomic_status.as_ref());
    list(&mut out, "synonyms", &record.synonyms);
    list(&mut out, "native to", &record.distribution.native);
    list(&mut out, "introduced", &record.distribution.introduced);
    field(&mut out, "source", Some(&record.source_url));

    out
}

fn field(out: &mut String, label: &str, value: Option<&String>) {
    if let Some(value) = value {
        out.push_str(&format!("  {label:<11} {value}\n"));
    }
}

fn list(out: &mut String, label: &str, values: &[String]) {
    if !values.is_empty() {
        out.push_str(&format!("  {label:<11} {}\n", values.join(", ")));
    }
}

fn render_message(message: &Response) -> String {
    match message {
        Response::ProcessBegin { summary } => format!("> {summary}"),
        Response::ProcessLog { text, .. } => format!("  {text}"),
        Response::Artifact {
            description, uris, ..
        } => {
            let mut s = format!("  [artifact] {description}");
            for uri in uris {
                s.push_str(&format!("\n    {uri}"));
            }
            s
        }
        Response::Reply { text, data } => match data.as_ref().and_then(|d| d.get("error")) {
            Some(error) => format!("{text}: {}", error.as_str().unwrap_or_default()),
            None => text.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Distribution, SpeciesQuery};

    fn lookup(records: Vec<SpeciesRecord>) -> Lookup {
        Lookup {
            query: SpeciesQuery::new("Quercus", "alba").unwrap(),
            search_url: "http://powo/search".to_string(),
            total_found: records.len(),
            records,
        }
    }

    #[test]
    fn test_render_empty() {
        let s = render(&lookup(vec![]));
        assert!(s.contains("matches: 0"));
        assert!(s.contains("no plants found matching Quercus alba"));
    }

    #[test]
    fn test_render_record() {
        let record = SpeciesRecord {
            fq_id: "urn:1".to_string(),
            accepted_name: "Quercus alba".to_string(),
            authors: Some("L.".to_string()),
            family: Some("Fagaceae".to_string()),
            rank: None,
            taxonomic_status: Some("Accepted".to_string()),
            synonyms: vec!["Quercus candida".to_string(), "Quercus ramosa".to_string()],
            distribution: Distribution {
                native: vec!["Alabama".to_string()],
                introduced: vec![],
            },
            source_url: "http://powo/taxon/urn:1".to_string(),
        };

        let s = render(&lookup(vec![record]));
        assert!(s.contains("Quercus alba L.\n"));
        assert!(s.contains("Quercus candida, Quercus ramosa"));
        assert!(s.contains("Alabama"));
        assert!(!s.contains("introduced"));
        assert!(!s.contains("rank"));
    }

    #[test]
    fn test_render_error_reply() {
        let msg = Response::Reply {
            text: "An error occurred".to_string(),
            data: Some(serde_json::json!({ "error": "boom" })),
        };
        assert_eq!(render_message(&msg), "An error occurred: boom");
    }
}
