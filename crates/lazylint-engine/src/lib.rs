pub mod fixes;
pub mod io;
pub mod parsing;
pub mod rule;
pub mod tokens;

// Re-export key types for easier usage
pub use fixes::apply_fixes;
pub use io::*;
pub use parsing::parse_tokens;
pub use rule::fix::{FixInfo, build_fix};
pub use rule::{LazyContinuationLines, Rule, RuleConfig, RuleParams, Violation, lint};
pub use tokens::{Token, TokenId, TokenTree, TokenType};
