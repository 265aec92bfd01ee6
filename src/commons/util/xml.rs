//! Support for the KMI XML documents.
use std::{fmt, io};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use xmlrs::attribute::OwnedAttribute;
use xmlrs::reader::XmlEvent;
use xmlrs::{reader, writer};
use xmlrs::{EmitterConfig, EventReader, EventWriter, ParserConfig};

//------------ XmlReader -----------------------------------------------------

/// A convenience wrapper for KMI XML parsing
///
/// KMI adds attributes and child elements to its documents over time, so
/// unlike a strict schema reader this type lets callers skip anything they
/// do not recognise.
pub struct XmlReader<R: io::Read> {
    /// The underlying xml-rs reader
    reader: EventReader<R>,

    /// Placeholder for an event so that 'peek' can be supported, as
    /// well as temporarily caching a close event in case a list of
    /// inner elements is processed.
    cached_event: Option<XmlEvent>,
}

/// Reader methods
impl<R: io::Read> XmlReader<R> {
    /// Gets the next XmlEvent
    ///
    /// Will take cached event if there is one
    fn next(&mut self) -> Result<XmlEvent, XmlReaderErr> {
        match self.cached_event.take() {
            Some(e) => Ok(e),
            None => Ok(self.reader.next()?),
        }
    }

    /// Puts an XmlEvent back so that it can be retrieved by 'next'
    fn cache(&mut self, e: XmlEvent) {
        self.cached_event = Some(e);
    }
}

/// Basic operations to parse the XML.
///
/// These methods are private because they are used by the higher level
/// closure based methods, defined below, that one should use to parse
/// XML safely.
impl<R: io::Read> XmlReader<R> {
    /// Takes the next element and expects a start of document.
    fn start_document(&mut self) -> Result<(), XmlReaderErr> {
        match self.next() {
            Ok(XmlEvent::StartDocument { .. }) => Ok(()),
            _ => Err(XmlReaderErr::ExpectedStartDocument),
        }
    }

    /// Takes the next element and expects a start element.
    fn expect_element(&mut self) -> Result<(Tag, Attributes), XmlReaderErr> {
        match self.next()? {
            XmlEvent::StartElement { name, attributes, .. } => Ok((
                Tag {
                    name: name.local_name,
                },
                Attributes { attributes },
            )),
            _ => Err(XmlReaderErr::ExpectedStart),
        }
    }

    /// Takes the next element and expects a close element with the given name.
    fn expect_close(&mut self, tag: Tag) -> Result<(), XmlReaderErr> {
        match self.next()? {
            XmlEvent::EndElement { name } if name.local_name == tag.name => Ok(()),
            _ => Err(XmlReaderErr::ExpectedClose(tag.name)),
        }
    }

    /// Takes the next element and expects the end of document.
    fn end_document(&mut self) -> Result<(), XmlReaderErr> {
        match self.next()? {
            XmlEvent::EndDocument => Ok(()),
            _ => Err(XmlReaderErr::ExpectedEnd),
        }
    }
}

/// Closure based parsing of XML.
///
/// This approach ensures that the consumer can only get opening tags, or
/// content (such as Characters), and process the enclosed content. In
/// particular it ensures that the consumer cannot accidentally get close
/// tags - so it forces that execution returns.
impl<R: io::Read> XmlReader<R> {
    /// Decodes an XML structure
    ///
    /// This method checks that the document starts, then passes a reader
    /// instance to the provided closure, and will return the result from
    /// that after checking that the XML document is fully processed.
    pub fn decode<F, T>(source: R, op: F) -> Result<T, XmlReaderErr>
    where
        F: FnOnce(&mut Self) -> Result<T, XmlReaderErr>,
    {
        let mut config = ParserConfig::new();
        config.trim_whitespace = true;
        config.ignore_comments = true;
        config.cdata_to_characters = true;

        let mut xml = XmlReader {
            reader: config.create_reader(source),
            cached_event: None,
        };

        xml.start_document()?;
        let res = op(&mut xml)?;
        xml.end_document()?;

        Ok(res)
    }

    /// Takes an element and process it in a closure
    ///
    /// This method checks that the next element is indeed a Start Element,
    /// and passes the Tag and Attributes and this reader to a closure. After
    /// the closure completes it will verify that the next element is the
    /// Close Element for this Tag, and returns the result from the closure.
    pub fn take_element<F, T>(&mut self, op: F) -> Result<T, XmlReaderErr>
    where
        F: FnOnce(&Tag, Attributes, &mut Self) -> Result<T, XmlReaderErr>,
    {
        let (tag, attr) = self.expect_element()?;
        let res = op(&tag, attr, self)?;
        self.expect_close(tag)?;
        Ok(res)
    }

    /// Takes a named element and process it in a closure
    pub fn take_named_element<F, T>(&mut self, name: &str, op: F) -> Result<T, XmlReaderErr>
    where
        F: FnOnce(Attributes, &mut Self) -> Result<T, XmlReaderErr>,
    {
        self.take_element(|t, a, r| {
            if t.name != name {
                Err(XmlReaderErr::ExpectedNamedStart(name.to_string()))
            } else {
                op(a, r)
            }
        })
    }

    /// Takes the next element that is part of a list of elements under the
    /// current element, and processes it using a closure. When the end of the
    /// list is encountered, i.e. the next element is not a start element, then
    /// the closure is not executed and Ok(None) is returned. The element is
    /// put back on the cache for processing by the parent structure.
    pub fn take_opt_element<F, T>(&mut self, op: F) -> Result<Option<T>, XmlReaderErr>
    where
        F: FnOnce(&Tag, Attributes, &mut Self) -> Result<Option<T>, XmlReaderErr>,
    {
        let n = self.next()?;
        match n {
            XmlEvent::StartElement { name, attributes, .. } => {
                let tag = Tag {
                    name: name.local_name,
                };
                let res = op(&tag, Attributes { attributes }, self)?;
                self.expect_close(tag)?;
                Ok(res)
            }
            _ => {
                self.cache(n);
                Ok(None)
            }
        }
    }

    /// Processes all child elements of the current element in order.
    ///
    /// The closure is called once per child. It must consume the content of
    /// the child, e.g. with [`take_opt_chars`](Self::take_opt_chars) or
    /// [`skip`](Self::skip).
    pub fn take_children<F>(&mut self, mut op: F) -> Result<(), XmlReaderErr>
    where
        F: FnMut(&Tag, Attributes, &mut Self) -> Result<(), XmlReaderErr>,
    {
        while self
            .take_opt_element(|t, a, r| op(t, a, r).map(Some))?
            .is_some()
        {}
        Ok(())
    }

    /// Takes characters, or an empty string if the element has no content.
    pub fn take_opt_chars(&mut self) -> Result<String, XmlReaderErr> {
        match self.next()? {
            XmlEvent::Characters(chars) => Ok(chars),
            e @ XmlEvent::EndElement { .. } => {
                self.cache(e);
                Ok(String::new())
            }
            _ => Err(XmlReaderErr::ExpectedCharacters),
        }
    }

    /// Skips all content up to the close of the current element.
    pub fn skip(&mut self) -> Result<(), XmlReaderErr> {
        let mut depth = 0usize;
        loop {
            match self.next()? {
                XmlEvent::StartElement { .. } => depth += 1,
                e @ XmlEvent::EndElement { .. } => {
                    if depth == 0 {
                        self.cache(e);
                        return Ok(());
                    }
                    depth -= 1;
                }
                XmlEvent::EndDocument => return Err(XmlReaderErr::ExpectedEnd),
                _ => {}
            }
        }
    }
}

//------------ XmlReaderErr --------------------------------------------------

#[derive(Debug)]
pub enum XmlReaderErr {
    ExpectedStartDocument,
    ExpectedStart,
    ExpectedNamedStart(String),
    ExpectedCharacters,
    ExpectedClose(String),
    ExpectedEnd,
    AttributesError(AttributesError),
    ReaderError(reader::Error),
}

impl fmt::Display for XmlReaderErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            XmlReaderErr::ExpectedStartDocument => write!(f, "Expected Start of Document"),
            XmlReaderErr::ExpectedStart => write!(f, "Expected Start Element"),
            XmlReaderErr::ExpectedNamedStart(name) => {
                write!(f, "Expected Start Element with name: {}", name)
            }
            XmlReaderErr::ExpectedCharacters => write!(f, "Expected Characters Element"),
            XmlReaderErr::ExpectedClose(name) => write!(f, "Expected Close Element with name: {}", name),
            XmlReaderErr::ExpectedEnd => write!(f, "Expected End of Document"),
            XmlReaderErr::AttributesError(e) => write!(f, "Attributes Error: {}", e),
            XmlReaderErr::ReaderError(e) => write!(f, "XML Reader Error: {}", e),
        }
    }
}

impl std::error::Error for XmlReaderErr {}

impl From<AttributesError> for XmlReaderErr {
    fn from(e: AttributesError) -> XmlReaderErr {
        XmlReaderErr::AttributesError(e)
    }
}

impl From<reader::Error> for XmlReaderErr {
    fn from(e: reader::Error) -> XmlReaderErr {
        XmlReaderErr::ReaderError(e)
    }
}

//------------ Attributes ----------------------------------------------------

/// A convenient wrapper for XML tag attributes
pub struct Attributes {
    /// The underlying xml-rs structure
    attributes: Vec<OwnedAttribute>,
}

impl Attributes {
    /// Takes an optional attribute by name
    pub fn take_opt(&mut self, name: &str) -> Option<String> {
        let i = self
            .attributes
            .iter()
            .position(|a| a.name.local_name == name);
        i.map(|i| self.attributes.swap_remove(i).value)
    }

    /// Takes an attribute by name, or an empty string if it is absent
    pub fn take_or_default(&mut self, name: &str) -> String {
        self.take_opt(name).unwrap_or_default()
    }

    /// Takes a required attribute by name
    pub fn take_req(&mut self, name: &str) -> Result<String, AttributesError> {
        self.take_opt(name)
            .ok_or_else(|| AttributesError::MissingAttribute(name.to_string()))
    }

    /// Takes a numeric attribute. Absent and empty values count as zero.
    pub fn take_i64(&mut self, name: &str) -> Result<i64, AttributesError> {
        match self.take_opt(name) {
            None => Ok(0),
            Some(value) if value.is_empty() => Ok(0),
            Some(value) => value
                .parse()
                .map_err(|_| AttributesError::InvalidNumber(name.to_string(), value)),
        }
    }
}

//------------ AttributesError -----------------------------------------------

#[derive(Debug)]
pub enum AttributesError {
    MissingAttribute(String),
    InvalidNumber(String, String),
}

impl fmt::Display for AttributesError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributesError::MissingAttribute(name) => write!(f, "Required attribute missing: {}", name),
            AttributesError::InvalidNumber(name, value) => {
                write!(f, "Attribute {} is not a number: {}", name, value)
            }
        }
    }
}

//------------ Tag -----------------------------------------------------------

pub struct Tag {
    pub name: String,
}

//------------ XmlWriter -----------------------------------------------------

/// A convenience wrapper for KMI XML generation
///
/// The KMI server expects compact documents without a declaration, and
/// empty elements written out in full (`<a></a>`).
pub struct XmlWriter<W> {
    /// The underlying xml-rs writer
    writer: EventWriter<W>,
}

/// Generate the XML.
impl<W: io::Write> XmlWriter<W> {
    fn emitter_result<T>(r: Result<T, writer::Error>) -> Result<T, io::Error> {
        r.map_err(|e| match e {
            writer::Error::Io(io) => io,
            other => io::Error::other(other.to_string()),
        })
    }

    /// Adds an element
    pub fn put_element<F>(&mut self, name: &str, attr: Option<&[(&str, &str)]>, op: F) -> Result<(), io::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), io::Error>,
    {
        let mut start = writer::XmlEvent::start_element(name);

        if let Some(v) = attr {
            for a in v {
                start = start.attr(a.0, a.1);
            }
        }

        Self::emitter_result(self.writer.write(start))?;
        op(self)?;
        Self::emitter_result(self.writer.write(writer::XmlEvent::end_element()))?;

        Ok(())
    }

    /// Adds an element with only text content
    pub fn put_text_element(&mut self, name: &str, attr: Option<&[(&str, &str)]>, text: &str) -> Result<(), io::Error> {
        self.put_element(name, attr, |w| w.put_text(text))
    }

    /// Puts some String in a characters element
    pub fn put_text(&mut self, text: &str) -> Result<(), io::Error> {
        if text.is_empty() {
            return Ok(());
        }
        Self::emitter_result(self.writer.write(writer::XmlEvent::characters(text)))
    }

    /// Converts bytes to base64 encoded Characters as the content, using the
    /// Standard character set, with padding.
    pub fn put_base64_std(&mut self, bytes: &[u8]) -> Result<(), io::Error> {
        let b64 = STANDARD.encode(bytes);
        self.put_text(&b64)
    }

    /// Use this for convenience where empty content is required
    pub fn empty(&mut self) -> Result<(), io::Error> {
        Ok(())
    }

    /// Sets up the writer config and returns a closure that is expected
    /// to add the actual content of the XML.
    fn encode<F>(w: W, op: F) -> Result<(), io::Error>
    where
        F: FnOnce(&mut Self) -> Result<(), io::Error>,
    {
        let writer = EmitterConfig::new()
            .write_document_declaration(false)
            .normalize_empty_elements(false)
            .perform_indent(false)
            .create_writer(w);

        let mut x = XmlWriter { writer };

        op(&mut x)
    }
}

impl XmlWriter<()> {
    /// Call this to encode XML into a Vec<u8>
    pub fn encode_vec<F>(op: F) -> Result<Vec<u8>, io::Error>
    where
        F: FnOnce(&mut XmlWriter<&mut Vec<u8>>) -> Result<(), io::Error>,
    {
        let mut b = Vec::new();
        XmlWriter::encode(&mut b, op)?;
        Ok(b)
    }

    /// Call this to encode XML into a String
    pub fn encode_string<F>(op: F) -> Result<String, io::Error>
    where
        F: FnOnce(&mut XmlWriter<&mut Vec<u8>>) -> Result<(), io::Error>,
    {
        let bytes = Self::encode_vec(op)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

//------------ Tests ---------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn should_write_compact_xml() {
        let xml = XmlWriter::encode_string(|w| {
            w.put_element("a", Some(&[("type", "union"), ("c", "d")]), |w| {
                w.put_text_element("b", None, "X & Y")?;
                w.put_element("e", None, |w| w.empty())
            })
        })
        .unwrap();

        assert_eq!(xml, "<a type=\"union\" c=\"d\"><b>X &amp; Y</b><e></e></a>");
    }

    #[test]
    fn should_write_base64() {
        let xml = XmlWriter::encode_string(|w| w.put_element("block", None, |w| w.put_base64_std(b"test"))).unwrap();
        assert_eq!(xml, "<block>dGVzdA==</block>");
    }

    #[test]
    fn should_skip_unknown_content() {
        let xml = r#"<?xml version="1.0"?>
            <root name="r">
              <unknown a="b"><nested>text</nested><more/></unknown>
              <known>value</known>
              <empty></empty>
            </root>"#;

        let (name, known, empty) = XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("root", |mut a, r| {
                let name = a.take_req("name")?;
                let mut known = String::new();
                let mut empty = String::from("not empty");
                r.take_children(|t, _a, r| {
                    match t.name.as_str() {
                        "known" => known = r.take_opt_chars()?,
                        "empty" => empty = r.take_opt_chars()?,
                        _ => r.skip()?,
                    }
                    Ok(())
                })?;
                Ok((name, known, empty))
            })
        })
        .unwrap();

        assert_eq!(name, "r");
        assert_eq!(known, "value");
        assert_eq!(empty, "");
    }

    #[test]
    fn should_reject_unexpected_root() {
        let res = XmlReader::decode("<other/>".as_bytes(), |r| r.take_named_element("root", |_, _| Ok(())));
        assert!(matches!(res, Err(XmlReaderErr::ExpectedNamedStart(_))));
    }

    #[test]
    fn should_parse_numeric_attributes() {
        let xml = r#"<c modified="1683032101" distributed="" />"#;
        let (modified, distributed, missing) = XmlReader::decode(xml.as_bytes(), |r| {
            r.take_named_element("c", |mut a, _r| {
                Ok((
                    a.take_i64("modified")?,
                    a.take_i64("distributed")?,
                    a.take_i64("missing")?,
                ))
            })
        })
        .unwrap();

        assert_eq!(modified, 1683032101);
        assert_eq!(distributed, 0);
        assert_eq!(missing, 0);

        let res = XmlReader::decode(r#"<c modified="soon"/>"#.as_bytes(), |r| {
            r.take_named_element("c", |mut a, _r| Ok(a.take_i64("modified")?))
        });
        assert!(matches!(
            res,
            Err(XmlReaderErr::AttributesError(AttributesError::InvalidNumber(_, _)))
        ));
    }
}
