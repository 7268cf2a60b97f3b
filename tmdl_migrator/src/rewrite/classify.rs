use super::{flat_file, two_step};
use serde::Serialize;

/// Which rewrite strategy a source block needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    FlatFile,
    TwoStep,
    Unrecognized,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::FlatFile => "flat-file",
            Shape::TwoStep => "two-step",
            Shape::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flat-file call anywhere in the body wins over the two-step idiom
pub fn classify(body: &str) -> Shape {
    if flat_file::has_call_site(body) {
        Shape::FlatFile
    } else if two_step::find_idiom(body).is_some() {
        Shape::TwoStep
    } else {
        Shape::Unrecognized
    }
}
