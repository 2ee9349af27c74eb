//! Splitting vendor SQL scripts into individually executable statements.

use crate::error::DdlError;
use crate::types::DatabaseKind;
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer};
use std::path::Path;

/// Split `sql` into top-level statements.
///
/// Statements end at `;` and, for Microsoft and Sybase scripts, at a `GO`
/// batch separator standing alone on its line. Separators inside string
/// literals, quoted identifiers, or comments never split. Returned statements
/// are trimmed slices of the original text without their terminator; empty
/// statements are dropped.
pub fn split_script(sql: &str, kind: DatabaseKind, path: &Path) -> Result<Vec<String>, DdlError> {
    let dialect = kind.to_sqlparser_dialect();
    let tokens: Vec<TokenWithSpan> = Tokenizer::new(dialect.as_ref(), sql)
        .tokenize_with_location()
        .map_err(|err| DdlError::ScriptParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?
        .into_iter()
        .filter(|token| !matches!(token.token, Token::Whitespace(_) | Token::EOF))
        .collect();

    let offsets = LineOffsets::new(sql);
    let go_separator = kind.uses_go_separator();

    let mut statements = Vec::new();
    let mut current_start: Option<usize> = None;
    let mut current_end = 0;

    for (index, token) in tokens.iter().enumerate() {
        let is_separator = matches!(token.token, Token::SemiColon)
            || (go_separator && is_go_line(&tokens, index));

        if is_separator {
            if let Some(start) = current_start.take() {
                push_statement(&mut statements, sql, start, current_end);
            }
            continue;
        }

        let start = offsets.offset(token.span.start).unwrap_or(sql.len());
        let end = offsets.offset(token.span.end).unwrap_or(sql.len());
        current_start.get_or_insert(start);
        current_end = end.max(start);
    }

    if let Some(start) = current_start {
        push_statement(&mut statements, sql, start, current_end);
    }

    Ok(statements)
}

fn push_statement(statements: &mut Vec<String>, sql: &str, start: usize, end: usize) {
    let Some(text) = sql.get(start..end.max(start)) else {
        return;
    };
    let text = text.trim();
    if !text.is_empty() {
        statements.push(text.to_string());
    }
}

/// An unquoted `GO` word with no other token on its line.
fn is_go_line(tokens: &[TokenWithSpan], index: usize) -> bool {
    let token = &tokens[index];
    let Token::Word(word) = &token.token else {
        return false;
    };
    if word.quote_style.is_some() || !word.value.eq_ignore_ascii_case("GO") {
        return false;
    }

    let line = token.span.start.line;
    let previous_on_line = index
        .checked_sub(1)
        .and_then(|prev| tokens.get(prev))
        .is_some_and(|prev| prev.span.end.line == line);
    let next_on_line = tokens
        .get(index + 1)
        .is_some_and(|next| next.span.start.line == line);

    !previous_on_line && !next_on_line
}

/// Byte offsets of each line start, for converting tokenizer locations.
struct LineOffsets<'a> {
    sql: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineOffsets<'a> {
    fn new(sql: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(sql.match_indices('\n').map(|(offset, _)| offset + 1));
        Self { sql, starts }
    }

    /// Convert a 1-based line/column location to a byte offset.
    fn offset(&self, location: Location) -> Option<usize> {
        if location.line == 0 || location.column == 0 {
            return None;
        }
        let line_start = *self.starts.get(location.line as usize - 1)?;
        let line = &self.sql[line_start..];
        let column = location.column as usize - 1;

        match line.char_indices().nth(column) {
            Some((offset, _)) => Some(line_start + offset),
            None if line.chars().count() == column => Some(self.sql.len()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(sql: &str, kind: DatabaseKind) -> Vec<String> {
        split_script(sql, kind, Path::new("test.sql")).unwrap()
    }

    #[test]
    fn test_splits_on_semicolons() {
        let sql = "CREATE TABLE a (id INT);\n\nCREATE TABLE b (id INT REFERENCES a(id));\n";
        assert_eq!(
            split(sql, DatabaseKind::Default),
            vec![
                "CREATE TABLE a (id INT)",
                "CREATE TABLE b (id INT REFERENCES a(id))",
            ]
        );
    }

    #[test]
    fn test_keeps_semicolons_inside_strings_and_comments() {
        let sql = "INSERT INTO t VALUES ('a;b'); -- trailing; comment\nDROP TABLE t";
        assert_eq!(
            split(sql, DatabaseKind::Postgres),
            vec!["INSERT INTO t VALUES ('a;b')", "DROP TABLE t"]
        );
    }

    #[test]
    fn test_final_statement_without_terminator() {
        assert_eq!(split("DROP TABLE a", DatabaseKind::Oracle), vec!["DROP TABLE a"]);
    }

    #[test]
    fn test_empty_statements_are_dropped() {
        assert!(split(" ;; \n ; ", DatabaseKind::Default).is_empty());
    }

    #[test]
    fn test_go_separates_microsoft_batches() {
        let sql = "CREATE TABLE a (id INT)\nGO\ncreate table b (id INT)\ngo\n";
        assert_eq!(
            split(sql, DatabaseKind::Microsoft),
            vec!["CREATE TABLE a (id INT)", "create table b (id INT)"]
        );
    }

    #[test]
    fn test_go_inside_a_line_is_not_a_separator() {
        let sql = "CREATE TABLE go (id INT)\nGO";
        assert_eq!(split(sql, DatabaseKind::Sybase), vec!["CREATE TABLE go (id INT)"]);
    }

    #[test]
    fn test_go_is_plain_text_for_other_vendors() {
        let sql = "CREATE TABLE a (id INT)\nGO\n";
        assert_eq!(split(sql, DatabaseKind::Db2), vec!["CREATE TABLE a (id INT)\nGO"]);
    }

    #[test]
    fn test_multibyte_text_is_sliced_on_char_boundaries() {
        let sql = "INSERT INTO t VALUES ('żółw');\nINSERT INTO t VALUES ('ß')";
        assert_eq!(
            split(sql, DatabaseKind::Default),
            vec!["INSERT INTO t VALUES ('żółw')", "INSERT INTO t VALUES ('ß')"]
        );
    }

    #[test]
    fn test_tokenizer_failure_names_the_script() {
        let err = split_script("SELECT 'unterminated", DatabaseKind::Default, Path::new("bad.sql"))
            .unwrap_err();
        match err {
            DdlError::ScriptParse { path, .. } => assert_eq!(path, Path::new("bad.sql")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
