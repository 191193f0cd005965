//! Streaming reader for OpenStreetMap XML extracts.
//!
//! [`ElementStream`] pulls events from `quick-xml` and assembles one
//! [`OsmElement`] at a time, complete with its `tag` and `nd` children. Only
//! the element under construction is held in memory.

use std::fmt;
use std::io::{BufRead, BufReader};
use std::str::Utf8Error;

use bzip2::read::MultiBzDecoder;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;
use wrangle_core::{ElementKind, OsmElement, RawTag};

const STREAM_ORIGIN: &str = "<stream>";

/// Errors raised while streaming elements.
#[derive(Debug, Error)]
pub enum ElementStreamError {
    /// The input file could not be opened.
    #[error("failed to open OSM XML file at {path:?}")]
    Open {
        /// Path that failed to open.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not well-formed XML.
    #[error("malformed OSM XML in {origin}")]
    Malformed {
        /// File (or stream label) being read.
        origin: Utf8PathBuf,
        /// Parser error.
        #[source]
        source: quick_xml::Error,
    },
    /// An attribute name is not valid UTF-8.
    #[error("non-UTF-8 attribute name in {origin}")]
    NonUtf8 {
        /// File (or stream label) being read.
        origin: Utf8PathBuf,
        /// Decoding error.
        #[source]
        source: Utf8Error,
    },
    /// The document ended with elements still open.
    #[error("OSM XML in {origin} ended inside an open element")]
    Truncated {
        /// File (or stream label) being read.
        origin: Utf8PathBuf,
    },
}

impl ElementStreamError {
    fn malformed(origin: &Utf8Path, source: quick_xml::Error) -> Self {
        Self::Malformed {
            origin: origin.to_path_buf(),
            source,
        }
    }
}

/// Stream over a file opened by [`open_element_stream`].
pub type FileElementStream = ElementStream<Box<dyn BufRead>>;

#[derive(Debug)]
struct Pending {
    element: OsmElement,
    depth: usize,
}

/// Lazy, non-restartable sequence of OSM elements in document order.
///
/// The iterator yields at most one error and then stops.
///
/// # Examples
/// ```
/// use wrangle_core::ElementKind;
/// use wrangle_data::ElementStream;
///
/// let xml = r#"<osm>
///   <node id="1" lat="41.88" lon="-87.63"><tag k="amenity" v="cafe"/></node>
///   <relation id="9"/>
/// </osm>"#;
/// let elements: Vec<_> = ElementStream::new(xml.as_bytes(), &[ElementKind::Node])
///     .collect::<Result<_, _>>()
///     .expect("well-formed input");
///
/// assert_eq!(elements.len(), 1);
/// assert_eq!(elements[0].id(), Some("1"));
/// assert_eq!(elements[0].tags()[0].value, "cafe");
/// ```
pub struct ElementStream<R> {
    reader: Reader<R>,
    origin: Utf8PathBuf,
    kinds: Vec<ElementKind>,
    buf: Vec<u8>,
    depth: usize,
    pending: Option<Pending>,
    done: bool,
}

impl<R> fmt::Debug for ElementStream<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementStream")
            .field("origin", &self.origin)
            .field("kinds", &self.kinds)
            .field("depth", &self.depth)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<R: BufRead> ElementStream<R> {
    /// Stream the requested element kinds from any buffered reader.
    pub fn new(input: R, kinds: &[ElementKind]) -> Self {
        Self {
            reader: Reader::from_reader(input),
            origin: Utf8PathBuf::from(STREAM_ORIGIN),
            kinds: kinds.to_vec(),
            buf: Vec::new(),
            depth: 0,
            pending: None,
            done: false,
        }
    }

    /// Label errors with the path the input came from.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<Utf8PathBuf>) -> Self {
        self.origin = origin.into();
        self
    }

    fn advance(&mut self) -> Result<Option<OsmElement>, ElementStreamError> {
        let mut buf = std::mem::take(&mut self.buf);
        let outcome = loop {
            buf.clear();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(source) => break Err(ElementStreamError::malformed(&self.origin, source)),
            };
            let step = match event {
                Event::Start(start) => {
                    self.depth += 1;
                    self.open(&start, false)
                }
                Event::Empty(start) => self.open(&start, true),
                Event::End(_) => Ok(self.close()),
                Event::Text(text) => text
                    .unescape()
                    .map(|_| None)
                    .map_err(|source| {
                        ElementStreamError::malformed(&self.origin, quick_xml::Error::from(source))
                    }),
                Event::Eof => {
                    break if self.depth > 0 {
                        Err(ElementStreamError::Truncated {
                            origin: self.origin.clone(),
                        })
                    } else {
                        Ok(None)
                    };
                }
                _ => Ok(None),
            };
            match step {
                Ok(Some(element)) => break Ok(Some(element)),
                Ok(None) => {}
                Err(err) => break Err(err),
            }
        };
        self.buf = buf;
        outcome
    }

    fn open(
        &mut self,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<Option<OsmElement>, ElementStreamError> {
        let name = start.name();
        let name = name.as_ref();

        if let Some(pending) = self.pending.as_mut() {
            match name {
                b"tag" => {
                    let mut attributes = decode_attributes(start, &self.origin)?;
                    let key = take_attribute(&mut attributes, "k").unwrap_or_default();
                    let value = take_attribute(&mut attributes, "v").unwrap_or_default();
                    pending.element.push_tag(RawTag::new(key, value));
                }
                b"nd" => {
                    let mut attributes = decode_attributes(start, &self.origin)?;
                    match take_attribute(&mut attributes, "ref") {
                        Some(node_id) => pending.element.push_node_ref(node_id),
                        None => debug!(
                            "skipping nd without ref inside {} {:?}",
                            pending.element.kind(),
                            pending.element.id()
                        ),
                    }
                }
                _ => {}
            }
            return Ok(None);
        }

        let Some(kind) = ElementKind::from_tag_name(name) else {
            return Ok(None);
        };
        if !self.kinds.contains(&kind) {
            return Ok(None);
        }

        let mut element = OsmElement::new(kind);
        for (attr_name, value) in decode_attributes(start, &self.origin)? {
            element.push_attribute(attr_name, value);
        }
        if empty {
            return Ok(Some(element));
        }
        self.pending = Some(Pending {
            element,
            depth: self.depth,
        });
        Ok(None)
    }

    fn close(&mut self) -> Option<OsmElement> {
        let closing = self.depth;
        self.depth = self.depth.saturating_sub(1);
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.depth == closing)
        {
            return self.pending.take().map(|pending| pending.element);
        }
        None
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<OsmElement, ElementStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn decode_attributes(
    start: &BytesStart<'_>,
    origin: &Utf8Path,
) -> Result<Vec<(String, String)>, ElementStreamError> {
    start
        .attributes()
        .map(|attribute| {
            let attribute = attribute.map_err(|source| {
                ElementStreamError::malformed(origin, quick_xml::Error::from(source))
            })?;
            let name = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|source| ElementStreamError::NonUtf8 {
                    origin: origin.to_path_buf(),
                    source,
                })?
                .to_owned();
            let value = attribute
                .unescape_value()
                .map_err(|source| {
                    ElementStreamError::malformed(origin, quick_xml::Error::from(source))
                })?
                .into_owned();
            Ok((name, value))
        })
        .collect()
}

fn take_attribute(attributes: &mut Vec<(String, String)>, name: &str) -> Option<String> {
    let index = attributes.iter().position(|(key, _)| key == name)?;
    Some(attributes.swap_remove(index).1)
}

/// Whether `path` names a bzip2-compressed file (`.bz2`, any case).
#[must_use]
pub fn is_bz2(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("bz2"))
}

/// Open `path` and stream the requested element kinds from it.
///
/// Files ending in `.bz2` are decompressed while reading.
///
/// # Errors
/// Returns [`ElementStreamError::Open`] when the file cannot be opened.
/// Decoding failures surface through the returned iterator.
pub fn open_element_stream(
    path: &Utf8Path,
    kinds: &[ElementKind],
) -> Result<FileElementStream, ElementStreamError> {
    let file = wrangle_fs::open_utf8_file(path).map_err(|source| ElementStreamError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let input: Box<dyn BufRead> = if is_bz2(path) {
        info!("Streaming bzip2-compressed OSM XML from {path}");
        Box::new(BufReader::new(MultiBzDecoder::new(file)))
    } else {
        info!("Streaming OSM XML from {path}");
        Box::new(BufReader::new(file))
    };
    Ok(ElementStream::new(input, kinds).with_origin(path))
}
