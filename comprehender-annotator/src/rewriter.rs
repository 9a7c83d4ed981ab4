//! Offset-tracking rewriter.
//!
//! Inserts documentation blocks into the lines of a file. Method start lines
//! refer to the original file, so every insertion shifts all later original
//! lines down. The rewriter keeps a running `offset` of inserted lines and
//! processes insertion points in ascending original order; an insertion
//! made out of order would land every later comment on the wrong line.

use comprehender_core::MethodRecord;
use tracing::debug;

/// Substring that marks the line a class comment is placed above.
pub const CLASS_MARKER: &str = "class ";

/// Result of [`rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// Output lines, each with its terminator.
    pub lines: Vec<String>,

    /// Whether the class comment found a declaration line.
    pub class_comment_placed: bool,

    /// Number of method comments inserted.
    pub methods_annotated: usize,
}

impl Rewritten {
    /// Joins the lines into file content.
    pub fn into_content(self) -> String {
        self.lines.concat()
    }
}

/// Splits file content into lines, keeping each line's terminator.
pub fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_string).collect()
}

/// Inserts the class comment and the method comments into `original_lines`.
///
/// `method_comments[i]` belongs to `methods[i]`; `None` (or a missing
/// entry) leaves that method untouched. The class comment and the method
/// comments are applied together in ascending original line order,
/// whatever order the methods arrive in, so a class declared below a
/// method does not shift that method's comment. Each inserted block is
/// followed by one blank line.
pub fn rewrite(
    original_lines: &[String],
    class_comment: Option<&str>,
    methods: &[MethodRecord],
    method_comments: &[Option<String>],
) -> Rewritten {
    let eol = line_ending(original_lines);

    // (original line, is_method, comment). The class block sorts first on a
    // shared line so it stays above any method comment there.
    let mut insertions: Vec<(usize, bool, &str)> = Vec::with_capacity(methods.len() + 1);

    let mut class_comment_placed = false;
    if let Some(comment) = class_comment {
        match original_lines
            .iter()
            .position(|line| line.contains(CLASS_MARKER))
        {
            Some(idx) => {
                insertions.push((idx, false, comment));
                class_comment_placed = true;
            }
            None => debug!("No class declaration line found; class comment dropped"),
        }
    }

    for (i, method) in methods.iter().enumerate() {
        if let Some(comment) = method_comments.get(i).and_then(|c| c.as_deref()) {
            insertions.push((method.start_line, true, comment));
        }
    }
    insertions.sort_by_key(|&(line, is_method, _)| (line, is_method));

    let mut lines = original_lines.to_vec();
    let mut offset = 0usize;
    let mut methods_annotated = 0;

    for (line, is_method, comment) in insertions {
        let insert_index = (line + offset).min(lines.len());
        let block = comment_block(comment, eol);
        offset += block.len();
        lines.splice(insert_index..insert_index, block);
        if is_method {
            methods_annotated += 1;
        }
    }

    Rewritten {
        lines,
        class_comment_placed,
        methods_annotated,
    }
}

/// The comment's lines followed by one blank line.
fn comment_block(comment: &str, eol: &str) -> Vec<String> {
    comment
        .lines()
        .map(|line| format!("{}{}", line, eol))
        .chain(std::iter::once(eol.to_string()))
        .collect()
}

/// Line terminator used for inserted lines: CRLF if the file uses it.
fn line_ending(lines: &[String]) -> &'static str {
    if lines.iter().any(|line| line.ends_with("\r\n")) {
        "\r\n"
    } else {
        "\n"
    }
}
