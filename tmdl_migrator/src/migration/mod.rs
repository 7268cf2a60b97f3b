//! Whole-document migration
//!
//! `migrate_document` joins the partition gate, block extraction and the block
//! rewriters into a single pure step over document text. The pipeline adds the
//! reading, backup and overwrite around it.

pub mod report;
pub mod request;

pub use report::{FileReport, RewriteStatus};
pub use request::{default_table_name, MigrationRequest, RequestError};

use crate::document::{self, Extraction};
use crate::rewrite::{self, BlockRewrite, ConnectionTarget};

/// Result of migrating a document's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// No partition marker
    Ineligible,
    /// Eligible but the output equals the input
    Unchanged { rewrite: Option<BlockRewrite> },
    Rewritten { text: String, rewrite: BlockRewrite },
}

pub fn migrate_document(document: &str, target: &ConnectionTarget, table: &str) -> DocumentOutcome {
    let block = match document::extract(document) {
        Extraction::Ineligible => return DocumentOutcome::Ineligible,
        Extraction::NoBlock => return DocumentOutcome::Unchanged { rewrite: None },
        Extraction::Block(block) => block,
    };

    let rewrite = rewrite::rewrite_block_detailed(block.body, target, table);
    let text = block.reassemble(&rewrite.body);

    if text == document {
        DocumentOutcome::Unchanged {
            rewrite: Some(rewrite),
        }
    } else {
        DocumentOutcome::Rewritten { text, rewrite }
    }
}

/// The migrated text, or the input when nothing changed
pub fn migrated_text(document: &str, target: &ConnectionTarget, table: &str) -> String {
    match migrate_document(document, target, table) {
        DocumentOutcome::Rewritten { text, .. } => text,
        DocumentOutcome::Ineligible | DocumentOutcome::Unchanged { .. } => document.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::Shape;
    use assert_matches::assert_matches;

    fn target() -> ConnectionTarget {
        ConnectionTarget::new("srv", "db")
    }

    const CSV_TABLE: &str = "table Orders\n\
        \tlineageTag: 1f2e\n\
        \n\
        \tcolumn Qty\n\
        \t\tdataType: int64\n\
        \t\tsourceColumn: Qty\n\
        \n\
        \t\tannotation SummarizationSetBy = Automatic\n\
        \n\
        \tpartition Orders = m\n\
        \t\tmode: import\n\
        \t\tsource =\n\
        \t\t\t\tlet\n\
        \t\t\t\t    Source = Csv.Document(File.Contents(\"C:\\\\data\\\\orders (2024).csv\"),[Delimiter=\",\", Columns=3, Encoding=65001, QuoteStyle=QuoteStyle.None]),\n\
        \t\t\t\t    #\"Promoted Headers\" = Table.PromoteHeaders(Source, [PromoteAllScalars=true]),\n\
        \t\t\t\t    #\"Changed Type\" = Table.TransformColumnTypes(#\"Promoted Headers\",{{\"Qty\", Int64.Type}})\n\
        \t\t\t\tin\n\
        \t\t\t\t    #\"Changed Type\"\n\
        \n\
        \tannotation PBI_ResultType = Table\n";

    const WORKBOOK_TABLE: &str = "table Sales\n\
        \tpartition Sales = m\n\
        \t\tmode: import\n\
        \t\tsource =\n\
        \t\t\t\tlet\n\
        \t\t\t\t    Source = Excel.Workbook(File.Contents(\"sales.xlsx\"), null, true),\n\
        \t\t\t\t    Sales_Sheet = Source{[Item=\"Sales\",Kind=\"Sheet\"]}[Data],\n\
        \t\t\t\t    #\"Promoted Headers\" = Table.PromoteHeaders(Sales_Sheet, [PromoteAllScalars=true]),\n\
        \t\t\t\t    #\"Changed Type\" = Table.TransformColumnTypes(#\"Promoted Headers\",{})\n\
        \t\t\t\tin\n\
        \t\t\t\t    #\"Changed Type\"\n\
        \n\
        \tannotation PBI_ResultType = Table\n";

    fn rewritten(outcome: DocumentOutcome) -> (String, BlockRewrite) {
        match outcome {
            DocumentOutcome::Rewritten { text, rewrite } => (text, rewrite),
            other => panic!("expected a rewrite, got {:?}", other),
        }
    }

    #[test]
    fn flat_file_document() {
        let (text, rewrite) = rewritten(migrate_document(CSV_TABLE, &target(), "Orders"));

        assert_eq!(rewrite.shape, Shape::FlatFile);
        assert!(text.contains("\t\t\t\t    Source = Sql.Database(\"srv\", \"db\"),\n"));
        assert!(text.contains(
            "\t\t\t\t    Orders = Source{[Schema=\"dbo\",Item=\"Orders\"]}[Data],\n"
        ));
        assert!(text.contains("Table.TransformColumnTypes(Orders,{{\"Qty\", Int64.Type}})"));
        assert!(!text.contains("Promoted Headers"));

        // Everything around the block is byte-identical.
        let head_len = CSV_TABLE.find("\t\tsource =").unwrap() + "\t\tsource =".len();
        assert_eq!(&text[..head_len], &CSV_TABLE[..head_len]);
        assert!(text.ends_with("\t\t\t\tin\n\t\t\t\t    #\"Changed Type\"\n\n\tannotation PBI_ResultType = Table\n"));
    }

    #[test]
    fn two_step_document() {
        let (text, rewrite) = rewritten(migrate_document(WORKBOOK_TABLE, &target(), "FactSales"));

        assert_eq!(rewrite.shape, Shape::TwoStep);
        assert!(text.contains(
            "\t\t\t\t    Source = Sql.Database(\"srv\", \"db\"),\n\
             \t\t\t\t    Sales_Sheet = Source{[Schema=\"dbo\",Item=\"FactSales\"]}[Data],\n\
             \t\t\t\t    #\"Changed Type\" = Table.TransformColumnTypes(Sales_Sheet,{})\n"
        ));
        let steps: Vec<_> = rewrite.splices.iter().map(|s| s.step.as_str()).collect();
        assert_eq!(steps, ["#\"Promoted Headers\""]);
    }

    #[test]
    fn migration_is_idempotent() {
        for (doc, table) in [(CSV_TABLE, "Orders"), (WORKBOOK_TABLE, "Sales")] {
            let once = migrated_text(doc, &target(), table);
            assert_ne!(once, doc);
            assert_matches!(
                migrate_document(&once, &target(), table),
                DocumentOutcome::Unchanged { .. }
            );
        }
    }

    #[test]
    fn document_without_partition_is_ineligible() {
        let doc = CSV_TABLE.replace("partition Orders = m", "partition Orders = calculated");
        assert_matches!(
            migrate_document(&doc, &target(), "Orders"),
            DocumentOutcome::Ineligible
        );
        assert_eq!(migrated_text(&doc, &target(), "Orders"), doc);
    }

    #[test]
    fn eligible_document_without_block_is_unchanged() {
        let doc = "table T\n\tpartition T = m\n\t\tmode: import\n";
        assert_matches!(
            migrate_document(doc, &target(), "T"),
            DocumentOutcome::Unchanged { rewrite: None }
        );
    }

    #[test]
    fn already_database_sourced_block_is_unchanged() {
        let doc = "partition T = m\n\tsource =\n\t\tlet\n\t\t\tSource = Sql.Database(\"a\", \"b\"),\n\t\t\tdbo_T = Source{[Schema=\"dbo\",Item=\"T\"]}[Data]\n\t\tin\n\t\t\tdbo_T\n";
        let outcome = migrate_document(doc, &target(), "T");
        // The idiom matches but points somewhere else, so it is a rewrite.
        assert_matches!(outcome, DocumentOutcome::Rewritten { .. });

        let same = migrate_document(doc, &ConnectionTarget::new("a", "b"), "T");
        assert_matches!(same, DocumentOutcome::Unchanged { rewrite: Some(_) });
    }
}
