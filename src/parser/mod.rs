//! Statement reader for schema dumps.
//!
//! Splits a byte stream into `;`-terminated statements and classifies them,
//! so the DDL parser only ever sees complete CREATE/ALTER/DROP statements.

mod compression;

pub use compression::Compression;

use std::io::{BufRead, BufReader, Read};

pub const SMALL_BUFFER_SIZE: usize = 64 * 1024;
pub const MEDIUM_BUFFER_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementType {
    Unknown,
    CreateTable,
    AlterTable,
    DropTable,
}

/// SQL dialect used for rendering the generated statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    MySql,
    Postgres,
    Sqlite,
}

impl std::str::FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(SqlDialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(SqlDialect::Postgres),
            "sqlite" | "sqlite3" => Ok(SqlDialect::Sqlite),
            _ => Err(format!(
                "Unknown dialect: {}. Valid options: mysql, postgres, sqlite",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::MySql => write!(f, "mysql"),
            SqlDialect::Postgres => write!(f, "postgres"),
            SqlDialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

pub struct Parser<R: Read> {
    reader: BufReader<R>,
    stmt_buffer: Vec<u8>,
}

impl<R: Read> Parser<R> {
    pub fn new(reader: R, buffer_size: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(buffer_size, reader),
            stmt_buffer: Vec::with_capacity(32 * 1024),
        }
    }

    /// Read the next `;`-terminated statement.
    ///
    /// Semicolons inside quoted strings, `-- line` comments and `/* block */`
    /// comments do not terminate a statement. A trailing statement without a
    /// terminator is returned as-is at end of input.
    pub fn read_statement(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        self.stmt_buffer.clear();

        let mut inside_single_quote = false;
        let mut inside_double_quote = false;
        let mut inside_line_comment = false;
        let mut inside_block_comment = false;
        let mut escaped = false;
        let mut prev: u8 = 0;

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                if self.stmt_buffer.iter().all(|b| b.is_ascii_whitespace()) {
                    return Ok(None);
                }
                let result = std::mem::take(&mut self.stmt_buffer);
                return Ok(Some(result));
            }

            let mut consumed = 0;
            let mut found_terminator = false;

            for (i, &b) in buf.iter().enumerate() {
                let last = prev;
                prev = b;

                if inside_line_comment {
                    if b == b'\n' {
                        inside_line_comment = false;
                    }
                    continue;
                }

                if inside_block_comment {
                    if b == b'/' && last == b'*' {
                        inside_block_comment = false;
                        prev = 0;
                    }
                    continue;
                }

                let inside_string = inside_single_quote || inside_double_quote;

                if escaped {
                    escaped = false;
                    continue;
                }

                if b == b'\\' && inside_string {
                    escaped = true;
                    continue;
                }

                if b == b'\'' && !inside_double_quote {
                    inside_single_quote = !inside_single_quote;
                } else if b == b'"' && !inside_single_quote {
                    inside_double_quote = !inside_double_quote;
                } else if !inside_string && b == b'-' && last == b'-' {
                    inside_line_comment = true;
                } else if !inside_string && b == b'*' && last == b'/' {
                    inside_block_comment = true;
                    prev = 0;
                } else if b == b';' && !inside_string {
                    self.stmt_buffer.extend_from_slice(&buf[..=i]);
                    consumed = i + 1;
                    found_terminator = true;
                    break;
                }
            }

            if found_terminator {
                self.reader.consume(consumed);
                let result = std::mem::take(&mut self.stmt_buffer);
                return Ok(Some(result));
            }

            self.stmt_buffer.extend_from_slice(buf);
            let len = buf.len();
            self.reader.consume(len);
        }
    }

    /// Classify a statement by its leading keywords, ignoring comments in front of it
    pub fn parse_statement(stmt: &[u8]) -> StatementType {
        let stmt = skip_leading_noise(stmt);

        let upper_prefix: Vec<u8> = stmt
            .iter()
            .take(20)
            .map(|b| b.to_ascii_uppercase())
            .collect();

        if starts_with_words(&upper_prefix, b"CREATE TABLE") {
            StatementType::CreateTable
        } else if starts_with_words(&upper_prefix, b"ALTER TABLE") {
            StatementType::AlterTable
        } else if starts_with_words(&upper_prefix, b"DROP TABLE") {
            StatementType::DropTable
        } else {
            StatementType::Unknown
        }
    }
}

/// Whether `data` opens with the words of `prefix`, allowing any whitespace
/// between them, and the last word is not just the start of a longer identifier
fn starts_with_words(data: &[u8], prefix: &[u8]) -> bool {
    let mut rest = data;
    for word in prefix.split(|&b| b == b' ') {
        rest = trim_ascii_start(rest);
        if !rest.starts_with(word) {
            return false;
        }
        rest = &rest[word.len()..];
    }
    rest.first()
        .is_some_and(|&b| !b.is_ascii_alphanumeric() && b != b'_')
}

/// Skip whitespace and any comments in front of a statement
pub fn skip_leading_noise(mut data: &[u8]) -> &[u8] {
    loop {
        data = trim_ascii_start(data);
        if data.starts_with(b"--") {
            data = match data.iter().position(|&b| b == b'\n') {
                Some(pos) => &data[pos + 1..],
                None => &[],
            };
        } else if data.starts_with(b"/*") && !data.starts_with(b"/*!") {
            data = match data.windows(2).position(|w| w == b"*/") {
                Some(pos) => &data[pos + 2..],
                None => &[],
            };
        } else {
            return data;
        }
    }
}

#[inline]
fn trim_ascii_start(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|&b| !is_whitespace(b))
        .unwrap_or(data.len());
    &data[start..]
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

pub fn determine_buffer_size(file_size: u64) -> usize {
    if file_size > 1024 * 1024 * 1024 {
        MEDIUM_BUFFER_SIZE
    } else {
        SMALL_BUFFER_SIZE
    }
}
