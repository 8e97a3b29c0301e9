use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::Exporter;
use crate::types::{ApiDocumentation, Result, RouteInfo};

const UNTAGGED: &str = "Other";

/// Markdown grouped by primary tag, with a table of contents
pub struct MarkdownExporter;

impl Exporter for MarkdownExporter {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn render(&self, docs: &ApiDocumentation, generated_at: DateTime<Utc>) -> Result<String> {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = write_document(&mut out, docs, generated_at);
        Ok(out)
    }
}

fn write_document(
    out: &mut String,
    docs: &ApiDocumentation,
    generated_at: DateTime<Utc>,
) -> std::fmt::Result {
    writeln!(out, "# {}\n", docs.title)?;
    if let Some(description) = &docs.description {
        writeln!(out, "{}\n", description)?;
    }
    writeln!(out, "**Version:** {}\n", docs.version)?;
    writeln!(
        out,
        "**Generated:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let groups = group_by_primary_tag(&docs.routes);

    writeln!(out, "## Table of Contents\n")?;
    for (tag, routes) in &groups {
        writeln!(out, "### {}", tag)?;
        for route in routes {
            writeln!(
                out,
                "- [{} {}](#{})",
                route.methods.join(", "),
                route.path,
                anchor(&route.path)
            )?;
        }
        writeln!(out)?;
    }
    writeln!(out, "\n---\n")?;

    for (tag, routes) in &groups {
        writeln!(out, "## {}\n", tag)?;
        if let Some(tag_description) = docs.tags.get(*tag).filter(|d| !d.is_empty()) {
            writeln!(out, "{}\n", tag_description)?;
        }
        for route in routes {
            write_route(out, route)?;
        }
    }

    Ok(())
}

fn write_route(out: &mut String, route: &RouteInfo) -> std::fmt::Result {
    writeln!(
        out,
        "### {} {} {{#{}}}\n",
        route.methods.join(", "),
        route.path,
        anchor(&route.path)
    )?;

    if !route.verified {
        writeln!(
            out,
            "> **Unverified:** not found in source (confidence {:.2})\n",
            route.confidence_score
        )?;
    }

    if let Some(summary) = &route.summary {
        writeln!(out, "**Summary:** {}\n", summary)?;
    }
    if let Some(description) = &route.description {
        writeln!(out, "{}\n", description)?;
    }
    if let Some(source_file) = &route.source_file {
        writeln!(out, "**Source:** `{}`\n", source_file)?;
    }

    if !route.parameters.is_empty() {
        writeln!(out, "#### Parameters\n")?;
        writeln!(out, "| Name | Type | Data Type | Required | Description |")?;
        writeln!(out, "|------|------|-----------|----------|-------------|")?;
        for param in &route.parameters {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                table_cell(&param.name),
                param.kind,
                table_cell(&param.data_type),
                if param.required { "✓" } else { "✗" },
                table_cell(param.description.as_deref().unwrap_or(""))
            )?;
        }
        writeln!(out)?;
    }

    if route.deprecated {
        writeln!(out, "⚠️ **Deprecated**\n")?;
    }

    writeln!(out, "---\n")
}

/// Routes grouped by first tag, groups and routes in first-seen order
fn group_by_primary_tag(routes: &[RouteInfo]) -> Vec<(&str, Vec<&RouteInfo>)> {
    let mut groups: Vec<(&str, Vec<&RouteInfo>)> = Vec::new();
    for route in routes {
        let tag = route.primary_tag().unwrap_or(UNTAGGED);
        match groups.iter_mut().find(|(name, _)| *name == tag) {
            Some((_, members)) => members.push(route),
            None => groups.push((tag, vec![route])),
        }
    }
    groups
}

fn anchor(path: &str) -> String {
    path.replace('/', "-").trim_start_matches('-').to_string()
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParameterKind, RouteParameter};

    fn render(docs: &ApiDocumentation) -> String {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        MarkdownExporter.render(docs, ts).unwrap()
    }

    #[test]
    fn test_grouping_and_markers() {
        let mut docs = ApiDocumentation::new("Shop");
        docs.description = Some("Sells things".into());
        docs.tags.insert("items".into(), "Item operations".into());

        let mut item = RouteInfo::new("/items/{id}", ["GET"])
            .with_summary("Get item")
            .with_description("Returns one item")
            .with_tags(["items"]);
        item.verified = true;
        item.parameters.push(
            RouteParameter::new("id", ParameterKind::Path)
                .required(true)
                .with_description("Item | id")
                .with_data_type("integer"),
        );

        let mut legacy = RouteInfo::new("/legacy", ["POST"]).with_confidence(0.9);
        legacy.deprecated = true;
        legacy.confidence_score = 0.45;

        docs.routes = vec![item, legacy];
        let md = render(&docs);

        assert!(md.starts_with("# Shop\n\nSells things\n\n**Version:** 1.0.0\n"));
        assert!(md.contains("**Generated:** 2024-05-01 12:00:00 UTC"));
        assert!(md.contains("### items\n- [GET /items/{id}](#items-{id})\n"));
        assert!(md.contains("### Other\n- [POST /legacy](#legacy)\n"));
        assert!(md.contains("## items\n\nItem operations\n"));
        assert!(md.contains("| id | path | integer | ✓ | Item \\| id |"));
        assert!(md.contains("> **Unverified:** not found in source (confidence 0.45)"));
        assert!(md.contains("⚠️ **Deprecated**"));
        assert_eq!(md.matches("**Unverified:**").count(), 1);
    }

    #[test]
    fn test_group_order_is_first_seen() {
        let routes = vec![
            RouteInfo::new("/b", ["GET"]).with_tags(["beta"]),
            RouteInfo::new("/a", ["GET"]).with_tags(["alpha"]),
            RouteInfo::new("/b2", ["GET"]).with_tags(["beta", "alpha"]),
        ];
        let groups = group_by_primary_tag(&routes);
        let names: Vec<_> = groups.iter().map(|(n, r)| (*n, r.len())).collect();
        assert_eq!(names, vec![("beta", 2), ("alpha", 1)]);
    }
}
