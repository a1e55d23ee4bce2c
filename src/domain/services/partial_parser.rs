#[cfg(test)]
#[path = "partial_parser_test.rs"]
mod tests;

use futures::stream;
use futures::Stream;
use futures::StreamExt;

use crate::domain::models::PartialTutorResponse;
use crate::domain::models::StreamError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum JsonState {
    Root,
    Finish,
    InsideString,
    InsideStringEscape,
    InsideStringUnicode(u8),
    InsideLiteral,
    InsideNumber,
    ObjectStart,
    ObjectKey,
    ObjectKeyEscape,
    ObjectAfterKey,
    ObjectBeforeValue,
    ObjectAfterValue,
    ObjectAfterComma,
    ArrayStart,
    ArrayAfterValue,
    ArrayAfterComma,
}

const LITERALS: [&str; 3] = ["true", "false", "null"];

struct JsonRepair<'a> {
    input: &'a str,
    stack: Vec<JsonState>,
    last_valid_end: usize,
    literal_start: usize,
    number_fallback: usize,
}

impl<'a> JsonRepair<'a> {
    fn new(input: &'a str) -> JsonRepair<'a> {
        return JsonRepair {
            input,
            stack: vec![JsonState::Root],
            last_valid_end: 0,
            literal_start: 0,
            number_fallback: 0,
        };
    }

    fn top(&self) -> JsonState {
        return *self.stack.last().unwrap_or(&JsonState::Finish);
    }

    fn swap(&mut self, state: JsonState) {
        self.stack.pop();
        self.stack.push(state);
    }

    fn unexpected(&self, char: char, idx: usize) -> StreamError {
        return StreamError::Decode(format!(
            "unexpected character {char:?} at byte {idx} while in {:?}",
            self.top()
        ));
    }

    fn start_value(
        &mut self,
        char: char,
        idx: usize,
        end: usize,
        next: JsonState,
    ) -> Result<(), StreamError> {
        match char {
            '"' => {
                self.last_valid_end = end;
                self.swap(next);
                self.stack.push(JsonState::InsideString);
            }
            't' | 'f' | 'n' => {
                self.last_valid_end = end;
                self.literal_start = idx;
                self.swap(next);
                self.stack.push(JsonState::InsideLiteral);
            }
            '-' => {
                self.number_fallback = self.last_valid_end;
                self.swap(next);
                self.stack.push(JsonState::InsideNumber);
            }
            '0'..='9' => {
                self.number_fallback = self.last_valid_end;
                self.last_valid_end = end;
                self.swap(next);
                self.stack.push(JsonState::InsideNumber);
            }
            '{' => {
                self.last_valid_end = end;
                self.swap(next);
                self.stack.push(JsonState::ObjectStart);
            }
            '[' => {
                self.last_valid_end = end;
                self.swap(next);
                self.stack.push(JsonState::ArrayStart);
            }
            c if c.is_whitespace() => (),
            _ => return Err(self.unexpected(char, idx)),
        }

        return Ok(());
    }

    fn after_value(&mut self, char: char, idx: usize, end: usize) -> Result<(), StreamError> {
        match (self.top(), char) {
            (JsonState::ObjectAfterValue, ',') => self.swap(JsonState::ObjectAfterComma),
            (JsonState::ObjectAfterValue, '}') | (JsonState::ArrayAfterValue, ']') => {
                self.last_valid_end = end;
                self.stack.pop();
            }
            (JsonState::ArrayAfterValue, ',') => self.swap(JsonState::ArrayAfterComma),
            (JsonState::Finish, c) | (JsonState::ObjectAfterValue, c) | (JsonState::ArrayAfterValue, c)
                if c.is_whitespace() => {}
            _ => return Err(self.unexpected(char, idx)),
        }

        return Ok(());
    }

    fn step(&mut self, idx: usize, char: char) -> Result<(), StreamError> {
        let end = idx + char.len_utf8();

        match self.top() {
            JsonState::Root => self.start_value(char, idx, end, JsonState::Finish)?,
            JsonState::Finish => self.after_value(char, idx, end)?,
            JsonState::InsideString => match char {
                '"' => {
                    self.stack.pop();
                    self.last_valid_end = end;
                }
                '\\' => self.stack.push(JsonState::InsideStringEscape),
                _ => self.last_valid_end = end,
            },
            JsonState::InsideStringEscape => {
                if char == 'u' {
                    self.swap(JsonState::InsideStringUnicode(4));
                } else {
                    self.stack.pop();
                    self.last_valid_end = end;
                }
            }
            JsonState::InsideStringUnicode(remaining) => {
                if !char.is_ascii_hexdigit() {
                    return Err(self.unexpected(char, idx));
                }
                if remaining <= 1 {
                    self.stack.pop();
                    self.last_valid_end = end;
                } else {
                    self.swap(JsonState::InsideStringUnicode(remaining - 1));
                }
            }
            JsonState::InsideLiteral => {
                let input = self.input;
                let partial = &input[self.literal_start..end];
                if LITERALS.iter().any(|e| return e.starts_with(partial)) {
                    self.last_valid_end = end;
                } else {
                    self.stack.pop();
                    self.after_value(char, idx, end)?;
                }
            }
            JsonState::InsideNumber => match char {
                '0'..='9' => self.last_valid_end = end,
                'e' | 'E' | '-' | '+' | '.' => (),
                _ => {
                    self.stack.pop();
                    self.after_value(char, idx, end)?;
                }
            },
            JsonState::ObjectStart => match char {
                '"' => self.swap(JsonState::ObjectKey),
                '}' => {
                    self.last_valid_end = end;
                    self.stack.pop();
                }
                c if c.is_whitespace() => (),
                _ => return Err(self.unexpected(char, idx)),
            },
            JsonState::ObjectAfterComma => match char {
                '"' => self.swap(JsonState::ObjectKey),
                c if c.is_whitespace() => (),
                _ => return Err(self.unexpected(char, idx)),
            },
            JsonState::ObjectKey => match char {
                '"' => self.swap(JsonState::ObjectAfterKey),
                '\\' => self.stack.push(JsonState::ObjectKeyEscape),
                _ => (),
            },
            JsonState::ObjectKeyEscape => {
                self.stack.pop();
            }
            JsonState::ObjectAfterKey => match char {
                ':' => self.swap(JsonState::ObjectBeforeValue),
                c if c.is_whitespace() => (),
                _ => return Err(self.unexpected(char, idx)),
            },
            JsonState::ObjectBeforeValue => {
                self.start_value(char, idx, end, JsonState::ObjectAfterValue)?
            }
            JsonState::ObjectAfterValue | JsonState::ArrayAfterValue => {
                self.after_value(char, idx, end)?
            }
            JsonState::ArrayStart => {
                if char == ']' {
                    self.last_valid_end = end;
                    self.stack.pop();
                } else {
                    self.start_value(char, idx, end, JsonState::ArrayAfterValue)?;
                }
            }
            JsonState::ArrayAfterComma => {
                self.start_value(char, idx, end, JsonState::ArrayAfterValue)?
            }
        }

        return Ok(());
    }

    fn close(self) -> String {
        let cut = if self.top() == JsonState::InsideNumber {
            self.number_fallback
        } else {
            self.last_valid_end
        };

        let mut res = self.input[..cut].to_string();
        for state in self.stack.iter().rev() {
            match state {
                JsonState::InsideString => res.push('"'),
                JsonState::InsideLiteral => {
                    let partial = &self.input[self.literal_start..cut];
                    if let Some(literal) = LITERALS.iter().find(|e| return e.starts_with(partial)) {
                        res.push_str(&literal[partial.len()..]);
                    }
                }
                JsonState::ObjectStart
                | JsonState::ObjectKey
                | JsonState::ObjectKeyEscape
                | JsonState::ObjectAfterKey
                | JsonState::ObjectBeforeValue
                | JsonState::ObjectAfterValue
                | JsonState::ObjectAfterComma => res.push('}'),
                JsonState::ArrayStart | JsonState::ArrayAfterValue | JsonState::ArrayAfterComma => {
                    res.push(']')
                }
                JsonState::Root
                | JsonState::Finish
                | JsonState::InsideNumber
                | JsonState::InsideStringEscape
                | JsonState::InsideStringUnicode(_) => (),
            }
        }

        return res;
    }
}

/// Turns a truncated JSON document into the longest syntactically valid
/// document it is a prefix of. Dangling keys, separators, escapes and
/// unterminated numbers are dropped; open strings, literals and containers
/// are closed.
///
/// Fails when the input can never become valid JSON by appending more text.
pub fn repair_json(input: &str) -> Result<String, StreamError> {
    let mut repair = JsonRepair::new(input);
    for (idx, char) in input.char_indices() {
        repair.step(idx, char)?;
    }

    return Ok(repair.close());
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParserEvent {
    Partial(PartialTutorResponse),
    Final(PartialTutorResponse),
    Failed {
        last: Option<PartialTutorResponse>,
        error: StreamError,
    },
}

/// Incrementally decodes the text of one generation stream into
/// progressively more complete [`PartialTutorResponse`] snapshots.
#[derive(Default)]
pub struct PartialObjectParser {
    buffer: String,
    last: Option<PartialTutorResponse>,
    error: Option<StreamError>,
}

impl PartialObjectParser {
    /// Appends a chunk and returns a snapshot when it differs from the last one
    /// returned. Once a chunk is found to be malformed every later call fails
    /// with the same error.
    pub fn push(&mut self, chunk: &str) -> Result<Option<PartialTutorResponse>, StreamError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        self.buffer.push_str(chunk);
        let repaired = match repair_json(&self.buffer) {
            Ok(repaired) => repaired,
            Err(err) => {
                tracing::warn!(error = ?err, "Malformed chunk in generation stream");
                self.error = Some(err.clone());
                return Err(err);
            }
        };

        if repaired.is_empty() {
            return Ok(None);
        }

        let snapshot = match serde_json::from_str::<PartialTutorResponse>(&repaired) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::debug!(error = ?err, repaired = %repaired, "Skipping undecodable partial snapshot");
                return Ok(None);
            }
        };

        if snapshot.is_empty() || self.last.as_ref() == Some(&snapshot) {
            return Ok(None);
        }

        self.last = Some(snapshot.clone());
        return Ok(Some(snapshot));
    }

    /// Closes the stream. The buffered text must now be a complete document;
    /// if it is not, the last good snapshot is kept and the error reported.
    pub fn finish(self) -> ParserEvent {
        if let Some(error) = self.error {
            return ParserEvent::Failed {
                last: self.last,
                error,
            };
        }

        let error = match serde_json::from_str::<PartialTutorResponse>(self.buffer.trim()) {
            Ok(snapshot) if !snapshot.is_empty() => return ParserEvent::Final(snapshot),
            Ok(_) => StreamError::Decode("the response was empty".to_string()),
            Err(err) => StreamError::Decode(err.to_string()),
        };

        tracing::warn!(error = ?error, "Generation stream ended with an incomplete response");
        return ParserEvent::Failed {
            last: self.last,
            error,
        };
    }
}

/// Adapts a stream of raw text chunks into parser events. The output always
/// ends with exactly one `Final` or `Failed` event.
pub fn snapshots<S>(chunks: S) -> impl Stream<Item = ParserEvent>
where
    S: Stream<Item = Result<String, StreamError>>,
{
    let state = (Box::pin(chunks), Some(PartialObjectParser::default()));

    return stream::unfold(state, |(mut chunks, parser)| {
        return async move {
            let mut parser = parser?;
            loop {
                match chunks.next().await {
                    Some(Ok(chunk)) => match parser.push(&chunk) {
                        Ok(Some(snapshot)) => {
                            return Some((ParserEvent::Partial(snapshot), (chunks, Some(parser))));
                        }
                        Ok(None) => continue,
                        Err(error) => {
                            let event = ParserEvent::Failed {
                                last: parser.last,
                                error,
                            };
                            return Some((event, (chunks, None)));
                        }
                    },
                    Some(Err(error)) => {
                        let event = ParserEvent::Failed {
                            last: parser.last,
                            error,
                        };
                        return Some((event, (chunks, None)));
                    }
                    None => return Some((parser.finish(), (chunks, None))),
                }
            }
        };
    });
}
