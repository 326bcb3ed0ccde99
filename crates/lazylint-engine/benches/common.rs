// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_list_content(size: usize) -> String {
    let base = "# Title\n\nParagraph with some content.\n\n- Bullet point\ncontinued lazily\n  - Nested item\n    aligned continuation\n- Another item with *emphasis*\n      over-indented\n\n1. > Quoted item\n   lazy inside quote\n\n```rust\nfn example() {}\n```\n\n";
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_nested_lists(items: usize, depth: usize) -> String {
    let mut content = String::new();

    for item in 0..items {
        for level in 0..depth {
            let indent = "  ".repeat(level);
            content.push_str(&format!("{indent}- Item {item} at level {level}\n"));
            content.push_str(&format!("{indent}continuation {item}\n"));
        }
    }

    content
}
