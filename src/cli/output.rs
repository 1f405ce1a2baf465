//! Output formatting for recommendation lists.

use std::fmt::Write as _;

use crate::cli::args::OutputFormat;
use crate::error::{AffinityError, Result};
use crate::recommend::Recommendation;

/// Print recommendations to stdout in the requested format.
pub fn output_recommendations(
    recommendations: &[Recommendation],
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let rendered = render_recommendations(recommendations, format, pretty)?;
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    Ok(())
}

/// Render recommendations in the requested format.
pub fn render_recommendations(
    recommendations: &[Recommendation],
    format: OutputFormat,
    pretty: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(render_human(recommendations)),
        OutputFormat::Json => render_json(recommendations, pretty),
        OutputFormat::Csv => render_csv(recommendations),
    }
}

fn render_human(recommendations: &[Recommendation]) -> String {
    recommendations
        .iter()
        .map(|rec| format!("{}: {}", rec.user_id, rec.keys().join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_json(recommendations: &[Recommendation], pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(recommendations)?
    } else {
        serde_json::to_string(recommendations)?
    };
    Ok(json)
}

fn render_csv(recommendations: &[Recommendation]) -> Result<String> {
    let mut out = String::from("user_id,rank,item,score");
    for rec in recommendations {
        for (rank, item) in rec.items.iter().enumerate() {
            write!(
                out,
                "\n{},{},{},{}",
                rec.user_id,
                rank + 1,
                format_csv_value(&item.key),
                item.score
            )
            .map_err(|e| AffinityError::internal(format!("CSV formatting failed: {e}")))?;
        }
    }
    Ok(out)
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn format_csv_value(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::RecommendedItem;

    fn sample() -> Vec<Recommendation> {
        vec![
            Recommendation {
                user_id: 42,
                items: vec![
                    RecommendedItem {
                        key: "maps".to_string(),
                        code: 3,
                        score: 0.75,
                    },
                    RecommendedItem {
                        key: "chess, deluxe".to_string(),
                        code: 0,
                        score: 0.5,
                    },
                ],
            },
            Recommendation::empty(7),
        ]
    }

    #[test]
    fn test_human() {
        let out = render_recommendations(&sample(), OutputFormat::Human, false).unwrap();
        assert_eq!(out, "42: maps, chess, deluxe\n7: ");
    }

    #[test]
    fn test_json() {
        let out = render_recommendations(&sample(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value[0]["user_id"], 42);
        assert_eq!(value[0]["items"][0]["key"], "maps");
        assert_eq!(value[0]["items"][0]["code"], 3);
        assert_eq!(value[1]["items"].as_array().unwrap().len(), 0);

        let pretty = render_recommendations(&sample(), OutputFormat::Json, true).unwrap();
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn test_csv() {
        let out = render_recommendations(&sample(), OutputFormat::Csv, false).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines,
            vec![
                "user_id,rank,item,score",
                "42,1,maps,0.75",
                "42,2,\"chess, deluxe\",0.5",
            ]
        );
    }

    #[test]
    fn test_format_csv_value() {
        assert_eq!(format_csv_value("plain"), "plain");
        assert_eq!(format_csv_value("a\"b"), "\"a\"\"b\"");
    }
}
