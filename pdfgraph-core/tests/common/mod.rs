//! Minimal reader for the files the writer produces, used to check the output
//! structurally: xref offsets, trailer, object bodies and stream data.

#![allow(dead_code)]

use flate2::read::ZlibDecoder;
use std::collections::BTreeMap;
use std::io::Read;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(Vec<u8>),
    Name(String),
    Array(Vec<Value>),
    Dict(Vec<(String, Value)>),
    Ref(u32, u16),
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_ref_id(&self) -> Option<(u32, u16)> {
        match self {
            Value::Ref(n, g) => Some((*n, *g)),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        match self {
            Value::Dict(entries) => entries.iter().map(|(k, _)| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Every reference reachable inside this value.
    pub fn references(&self, out: &mut Vec<(u32, u16)>) {
        match self {
            Value::Ref(n, g) => out.push((*n, *g)),
            Value::Array(items) => items.iter().for_each(|v| v.references(out)),
            Value::Dict(entries) => entries.iter().for_each(|(_, v)| v.references(out)),
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndirectObject {
    pub number: u32,
    pub generation: u16,
    pub value: Value,
    pub stream: Option<Vec<u8>>,
}

impl IndirectObject {
    /// Stream bytes with the Flate filter undone.
    pub fn decoded_stream(&self) -> Vec<u8> {
        let data = self.stream.clone().expect("object is not a stream");
        match self.value.get("Filter").and_then(Value::as_name) {
            Some("FlateDecode") => {
                let mut out = Vec::new();
                ZlibDecoder::new(&data[..])
                    .read_to_end(&mut out)
                    .expect("invalid zlib data");
                out
            }
            _ => data,
        }
    }
}

#[derive(Debug)]
pub struct ParsedPdf {
    pub version: String,
    pub trailer: Value,
    pub xref_offset: usize,
    /// In-use xref entries by object number.
    pub offsets: BTreeMap<u32, usize>,
    pub objects: BTreeMap<u32, IndirectObject>,
}

impl ParsedPdf {
    pub fn object(&self, number: u32) -> &IndirectObject {
        self.objects
            .get(&number)
            .unwrap_or_else(|| panic!("object {number} missing"))
    }

    pub fn resolve(&self, value: &Value) -> &IndirectObject {
        let (number, _) = value.as_ref_id().expect("expected a reference");
        self.object(number)
    }

    pub fn root(&self) -> &IndirectObject {
        self.resolve(self.trailer.get("Root").expect("trailer has no Root"))
    }

    /// Page dictionaries in page-tree order.
    pub fn pages(&self) -> Vec<&IndirectObject> {
        let tree = self.resolve(self.root().value.get("Pages").expect("no Pages"));
        tree.value
            .get("Kids")
            .and_then(Value::as_array)
            .expect("no Kids")
            .iter()
            .map(|kid| self.resolve(kid))
            .collect()
    }
}

/// Parses a whole file through its cross-reference table.
pub fn parse_pdf(bytes: &[u8]) -> ParsedPdf {
    assert!(bytes.starts_with(b"%PDF-"), "missing header");
    let header_end = bytes.iter().position(|&b| b == b'\n').expect("header");
    let version = String::from_utf8(bytes[5..header_end].to_vec()).expect("version");

    assert!(bytes.ends_with(b"%%EOF\n"), "missing EOF marker");
    let startxref = rfind(bytes, b"startxref\n").expect("no startxref");
    let mut lexer = Lexer::new(bytes, startxref + b"startxref\n".len());
    let xref_offset = match lexer.value() {
        Value::Int(i) => i as usize,
        other => panic!("bad startxref {other:?}"),
    };
    assert!(bytes[xref_offset..].starts_with(b"xref\n"), "startxref does not point at xref");

    let mut pos = xref_offset + b"xref\n".len();
    let line_end = pos + bytes[pos..].iter().position(|&b| b == b'\n').expect("subsection");
    let subsection = std::str::from_utf8(&bytes[pos..line_end]).expect("subsection");
    let mut parts = subsection.split(' ');
    assert_eq!(parts.next(), Some("0"));
    let size: u32 = parts.next().and_then(|s| s.parse().ok()).expect("size");
    pos = line_end + 1;

    let mut offsets = BTreeMap::new();
    for number in 0..size {
        let entry = &bytes[pos..pos + 20];
        assert_eq!(&entry[18..], b" \n", "xref entry {number} is not 20 bytes");
        let entry = std::str::from_utf8(&entry[..18]).expect("xref entry");
        let offset: usize = entry[..10].parse().expect("offset");
        match &entry[17..18] {
            "n" => {
                offsets.insert(number, offset);
            }
            "f" => {}
            other => panic!("bad xref entry type {other}"),
        }
        pos += 20;
    }

    assert!(bytes[pos..].starts_with(b"trailer\n"), "missing trailer");
    let mut lexer = Lexer::new(bytes, pos + b"trailer\n".len());
    let trailer = lexer.value();
    assert_eq!(trailer.get("Size").and_then(Value::as_int), Some(size as i64));

    let objects = offsets
        .iter()
        .map(|(&number, &offset)| {
            let object = parse_indirect(bytes, offset);
            assert_eq!(object.number, number, "xref offset for {number} is wrong");
            (number, object)
        })
        .collect();

    ParsedPdf {
        version,
        trailer,
        xref_offset,
        offsets,
        objects,
    }
}

fn parse_indirect(bytes: &[u8], offset: usize) -> IndirectObject {
    let mut lexer = Lexer::new(bytes, offset);
    let number = lexer.integer() as u32;
    let generation = lexer.integer() as u16;
    lexer.expect_keyword("obj");
    let value = lexer.value();

    lexer.skip_whitespace();
    let stream = if lexer.rest().starts_with(b"stream\n") {
        lexer.pos += b"stream\n".len();
        let length = value
            .get("Length")
            .and_then(Value::as_int)
            .expect("stream without direct Length") as usize;
        let data = bytes[lexer.pos..lexer.pos + length].to_vec();
        lexer.pos += length;
        assert!(
            lexer.rest().starts_with(b"\nendstream"),
            "Length of object {number} does not match its data"
        );
        lexer.pos += b"\nendstream".len();
        Some(data)
    } else {
        None
    };
    lexer.expect_keyword("endobj");

    IndirectObject {
        number,
        generation,
        value,
        stream,
    }
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self { bytes, pos }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\n' | b'\r' | b'\t')) {
            self.pos += 1;
        }
    }

    fn regular(&mut self) -> &'a [u8] {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b" \n\r\t()<>[]{}/%".contains(&b) {
                break;
            }
            self.pos += 1;
        }
        &self.bytes[start..self.pos]
    }

    fn integer(&mut self) -> i64 {
        self.skip_whitespace();
        let token = self.regular();
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("expected integer at {}", self.pos))
    }

    fn expect_keyword(&mut self, keyword: &str) {
        self.skip_whitespace();
        let token = self.regular();
        assert_eq!(token, keyword.as_bytes(), "expected {keyword} at {}", self.pos);
    }

    fn value(&mut self) -> Value {
        self.skip_whitespace();
        match self.peek().expect("unexpected end of input") {
            b'/' => {
                self.pos += 1;
                Value::Name(decode_name(self.regular()))
            }
            b'(' => Value::Str(self.literal_string()),
            b'[' => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_whitespace();
                    if self.peek() == Some(b']') {
                        self.pos += 1;
                        break;
                    }
                    items.push(self.value());
                }
                Value::Array(items)
            }
            b'<' if self.rest().starts_with(b"<<") => {
                self.pos += 2;
                let mut entries = Vec::new();
                loop {
                    self.skip_whitespace();
                    if self.rest().starts_with(b">>") {
                        self.pos += 2;
                        break;
                    }
                    let key = match self.value() {
                        Value::Name(key) => key,
                        other => panic!("dictionary key is not a name: {other:?}"),
                    };
                    let value = self.value();
                    entries.push((key, value));
                }
                Value::Dict(entries)
            }
            b'<' => {
                self.pos += 1;
                let end = self.pos + self.rest().iter().position(|&b| b == b'>').expect("hex");
                let hex = std::str::from_utf8(&self.bytes[self.pos..end]).expect("hex");
                self.pos = end + 1;
                Value::Str(
                    (0..hex.len())
                        .step_by(2)
                        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("hex digit"))
                        .collect(),
                )
            }
            _ => self.number_or_keyword(),
        }
    }

    fn number_or_keyword(&mut self) -> Value {
        let token = std::str::from_utf8(self.regular()).expect("token").to_string();
        match token.as_str() {
            "null" => return Value::Null,
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if token.contains('.') {
            return Value::Real(token.parse().expect("real"));
        }
        let number: i64 = token
            .parse()
            .unwrap_or_else(|_| panic!("unexpected token {token:?}"));

        // `n g R`
        let save = self.pos;
        self.skip_whitespace();
        let generation = self.regular();
        if let Ok(generation) = std::str::from_utf8(generation).unwrap_or("").parse::<u16>() {
            self.skip_whitespace();
            if self.regular() == b"R" {
                return Value::Ref(number as u32, generation);
            }
        }
        self.pos = save;
        Value::Int(number)
    }

    fn literal_string(&mut self) -> Vec<u8> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut depth = 1;
        loop {
            let b = self.peek().expect("unterminated string");
            self.pos += 1;
            match b {
                b'\\' => {
                    let escaped = self.peek().expect("escape");
                    self.pos += 1;
                    match escaped {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'0'..=b'7' => {
                            let mut value = (escaped - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + (d - b'0') as u32;
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push(value as u8);
                        }
                        other => out.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    out.push(b);
                }
                _ => out.push(b),
            }
        }
        out
    }
}

fn decode_name(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hex = std::str::from_utf8(&raw[i + 1..i + 3]).expect("name escape");
            out.push(u8::from_str_radix(hex, 16).expect("name escape"));
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8(out).expect("name is not UTF-8")
}
