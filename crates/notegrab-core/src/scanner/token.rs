//! Adapter from the html5ever tokenizer to the few structural tokens the scanner
//! cares about.
//!
//! Bytes go in chunk by chunk as they arrive from the network; every call hands
//! back the tokens completed so far. Consecutive character tokens are coalesced
//! into a single `Text`, so text split across chunks or entity boundaries is seen
//! whole.

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

/// Structural token in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    HeadingOpen,
    HeadingClose,
    /// `<a>` start tag with every attribute value in source order.
    AnchorOpen { values: Vec<String> },
    AnchorClose,
    Text(String),
    End,
}

struct Collector {
    headings: Vec<String>,
    text: String,
    tokens: Vec<PageToken>,
}

impl Collector {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.tokens.push(PageToken::Text(std::mem::take(&mut self.text)));
        }
    }

    fn is_heading(&self, name: &str) -> bool {
        self.headings.iter().any(|h| h == name)
    }

    fn tag(&mut self, tag: Tag) -> TokenSinkResult<()> {
        let name: &str = &tag.name;
        let start = tag.kind == TagKind::StartTag;
        if name == "a" {
            self.tokens.push(if start {
                PageToken::AnchorOpen {
                    values: tag.attrs.iter().map(|a| String::from(&*a.value)).collect(),
                }
            } else {
                PageToken::AnchorClose
            });
        } else if self.is_heading(name) {
            self.tokens.push(if start {
                PageToken::HeadingOpen
            } else {
                PageToken::HeadingClose
            });
        } else if start && !tag.self_closing {
            // Without a tree builder the tokenizer must be told when content is raw,
            // otherwise `a<b` inside a script reads as a tag.
            match name {
                "script" => return TokenSinkResult::RawData(RawKind::ScriptData),
                "style" | "xmp" | "iframe" | "noembed" | "noframes" => {
                    return TokenSinkResult::RawData(RawKind::Rawtext)
                }
                "title" | "textarea" => return TokenSinkResult::RawData(RawKind::Rcdata),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

impl TokenSink for Collector {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(t) => self.text.push_str(&t),
            Token::NullCharacterToken | Token::ParseError(_) => {}
            Token::TagToken(tag) => {
                self.flush_text();
                return self.tag(tag);
            }
            Token::CommentToken(_) | Token::DoctypeToken(_) => self.flush_text(),
            Token::EOFToken => {
                self.flush_text();
                self.tokens.push(PageToken::End);
            }
        }
        TokenSinkResult::Continue
    }
}

/// Incremental tokenizer over a byte stream.
pub struct PageTokenizer {
    tokenizer: Tokenizer<Collector>,
    input: BufferQueue,
    /// Trailing bytes of an incomplete UTF-8 sequence from the previous chunk.
    carry: Vec<u8>,
}

impl PageTokenizer {
    /// `headings` are lowercase tag names treated as section headings.
    pub fn new(headings: &[String]) -> Self {
        let sink = Collector {
            headings: headings.to_vec(),
            text: String::new(),
            tokens: Vec::new(),
        };
        Self {
            tokenizer: Tokenizer::new(sink, TokenizerOpts::default()),
            input: BufferQueue::new(),
            carry: Vec::new(),
        }
    }

    /// Feed the next chunk of the page; returns tokens completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<PageToken> {
        let text = self.decode(bytes);
        self.push(&text);
        std::mem::take(&mut self.tokenizer.sink.tokens)
    }

    /// Signal end of stream; returns the remaining tokens, ending with `End`.
    pub fn finish(&mut self) -> Vec<PageToken> {
        if !self.carry.is_empty() {
            let tail = String::from_utf8_lossy(&self.carry).into_owned();
            self.carry.clear();
            self.push(&tail);
        }
        self.tokenizer.end();
        std::mem::take(&mut self.tokenizer.sink.tokens)
    }

    fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from_slice(text));
        let _ = self.tokenizer.feed(&mut self.input);
    }

    /// Decode as much of `carry + bytes` as forms complete UTF-8, replacing invalid
    /// sequences and holding back an incomplete trailing sequence.
    fn decode(&mut self, bytes: &[u8]) -> String {
        self.carry.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.carry.len());
        loop {
            match std::str::from_utf8(&self.carry) {
                Ok(s) => {
                    out.push_str(s);
                    self.carry.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.carry[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push('\u{FFFD}');
                            self.carry.drain(..valid + bad);
                        }
                        None => {
                            self.carry.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }
        out
    }
}
