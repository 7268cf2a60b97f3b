//! Source block rewriting
//!
//! `rewrite_block` is pure: it takes the body of a `source =` block, the
//! connection target and the table name, and returns the new body. Nothing here
//! touches the filesystem or the logging service.

pub mod classify;
pub mod flat_file;
pub mod rename;
pub mod splice;
pub mod two_step;

pub use classify::{classify, Shape};
pub use flat_file::FlatFileRewrite;
pub use splice::Splice;

use serde::{Deserialize, Serialize};

/// Server and database used verbatim in `Sql.Database("<server>", "<database>")`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub server: String,
    pub database: String,
}

impl ConnectionTarget {
    pub fn new(server: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            database: database.into(),
        }
    }

    pub fn connect_expression(&self) -> String {
        format!("Sql.Database(\"{}\", \"{}\")", self.server, self.database)
    }
}

/// `Source{[Schema="dbo",Item="<table>"]}[Data]`
pub fn table_selection(table: &str) -> String {
    format!("Source{{[Schema=\"dbo\",Item=\"{}\"]}}[Data]", table)
}

/// Everything the rewriters reported for one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRewrite {
    pub body: String,
    pub shape: Shape,
    /// Set on the flat-file path
    pub flat_file: Option<FlatFileRewrite>,
    /// Header-promotion steps removed after a two-step rewrite
    pub splices: Vec<Splice>,
}

/// Rewrite a block body and report what was done
pub fn rewrite_block_detailed(body: &str, target: &ConnectionTarget, table: &str) -> BlockRewrite {
    let shape = classify(body);

    match shape {
        Shape::FlatFile => {
            let flat = flat_file::rewrite(body, target, table);
            BlockRewrite {
                body: flat.body.clone(),
                shape,
                flat_file: Some(flat),
                splices: Vec::new(),
            }
        }
        Shape::TwoStep => {
            // An idiom that already reads from the target is left alone, splicer included.
            let (body, splices) = match two_step::rewrite(body, target, table) {
                Some(rewritten) if rewritten != body => splice::splice_header_steps(&rewritten),
                _ => (body.to_string(), Vec::new()),
            };
            BlockRewrite {
                body,
                shape,
                flat_file: None,
                splices,
            }
        }
        Shape::Unrecognized => BlockRewrite {
            body: body.to_string(),
            shape,
            flat_file: None,
            splices: Vec::new(),
        },
    }
}

/// Rewrite a block body
pub fn rewrite_block(body: &str, target: &ConnectionTarget, table: &str) -> String {
    rewrite_block_detailed(body, target, table).body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ConnectionTarget {
        ConnectionTarget::new("srv", "db")
    }

    #[test]
    fn connection_and_selection_text() {
        assert_eq!(target().connect_expression(), "Sql.Database(\"srv\", \"db\")");
        assert_eq!(
            table_selection("Sales"),
            "Source{[Schema=\"dbo\",Item=\"Sales\"]}[Data]"
        );
    }

    #[test]
    fn two_step_path_splices_header_step() {
        let body = "\n    let\n        Source = Excel.Workbook(File.Contents(\"s.xlsx\"), null, true),\n        Sheet = Source{[Item=\"Sales\",Kind=\"Sheet\"]}[Data],\n        #\"Promoted Headers\" = Table.PromoteHeaders(Sheet, [PromoteAllScalars=true]),\n        Typed = Table.TransformColumnTypes(#\"Promoted Headers\", {})\n    in\n        Typed\n";
        let result = rewrite_block_detailed(body, &target(), "Sales");

        assert_eq!(result.shape, Shape::TwoStep);
        assert_eq!(
            result.body,
            "\n    let\n        Source = Sql.Database(\"srv\", \"db\"),\n        Sheet = Source{[Schema=\"dbo\",Item=\"Sales\"]}[Data],\n        Typed = Table.TransformColumnTypes(Sheet, {})\n    in\n        Typed\n"
        );
        assert_eq!(result.splices.len(), 1);
        assert_eq!(result.splices[0].input, "Sheet");
    }

    #[test]
    fn flat_file_path_never_runs_the_splicer() {
        // A second header step on the flat-file path survives untouched.
        let body = "Source = Csv.Document(x),\n#\"Promoted Headers\" = Table.PromoteHeaders(Source, []),\nAgain = Table.PromoteHeaders(Other, []),\nin Again";
        let result = rewrite_block_detailed(body, &target(), "T");

        assert_eq!(result.shape, Shape::FlatFile);
        assert!(result.splices.is_empty());
        assert!(result.body.contains("Again = Table.PromoteHeaders(Other, []),"));
        assert!(result.body.contains("T = Source{[Schema=\"dbo\",Item=\"T\"]}[Data],"));
    }

    #[test]
    fn flat_file_output_is_a_fixed_point() {
        let body = "\n    let\n        Source = Csv.Document(File.Contents(\"o.csv\"), [Delimiter=\",\"]),\n        #\"Promoted Headers\" = Table.PromoteHeaders(Source, [PromoteAllScalars=true]),\n        #\"Changed Type\" = Table.TransformColumnTypes(#\"Promoted Headers\", {}),\n        #\"Promoted Headers1\" = Table.PromoteHeaders(#\"Changed Type\", [PromoteAllScalars=true])\n    in\n        #\"Promoted Headers1\"\n";
        let once = rewrite_block(body, &target(), "Orders");
        assert!(once.contains("#\"Promoted Headers1\" = Table.PromoteHeaders(#\"Changed Type\""));

        // The migrated body now looks like a two-step idiom.
        let again = rewrite_block_detailed(&once, &target(), "Orders");
        assert_eq!(again.shape, Shape::TwoStep);
        assert!(again.splices.is_empty());
        assert_eq!(again.body, once);
    }

    #[test]
    fn two_step_output_is_a_fixed_point() {
        let body = "  Source = Excel.Workbook(File.Contents(\"s.xlsx\"), null, true),\n  Sheet = Source{[Item=\"S\",Kind=\"Sheet\"]}[Data],\n  P1 = Table.PromoteHeaders(Sheet, []),\n  Skip = Table.Skip(P1, 1),\n  P2 = Table.PromoteHeaders(Skip, [])\nin\n  P2";
        let once = rewrite_block_detailed(body, &target(), "S");

        assert_eq!(once.splices.len(), 2);
        assert!(once.body.ends_with("  Skip = Table.Skip(Sheet, 1),\nin\n  Skip"));
        assert_eq!(rewrite_block(&once.body, &target(), "S"), once.body);
    }

    #[test]
    fn unrecognized_body_is_returned_unchanged() {
        let body = "\n  let\n    Source = Sql.Database(\"a\", \"b\"),\n    P = Table.PromoteHeaders(Source, [])\n  in P";
        assert_eq!(rewrite_block(body, &target(), "T"), body);
    }
}
