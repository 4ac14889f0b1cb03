use aho_corasick::{
    AhoCorasick,
    AhoCorasickBuilder,
    MatchKind,
};
use bytes::{
    Buf,
    BufMut,
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

pub const CRLF: &[u8] = b"\r\n";
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Frames the modem's byte stream into text lines.
///
/// Lines end in `\r\n`; the delimiter may arrive split across reads. Bytes that
/// are not valid UTF-8 are replaced rather than failing the stream. A line over
/// `max_length` is dropped up to its delimiter. Decoding never fails on content:
/// an error would end the `FramedRead` stream.
#[derive(Debug, Clone)]
pub struct LineCodec {
    delimiter:  Bytes,
    max_length: usize,

    ac: AhoCorasick,

    search_from: usize,
    discarding:  bool,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_length(DEFAULT_MAX_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        let ac = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build((1..CRLF.len() + 1).map(|i| &CRLF[..i]));

        Self {
            delimiter: Bytes::from_static(CRLF),
            max_length,
            ac,
            search_from: 0,
            discarding: false,
        }
    }

    #[inline]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    #[inline]
    fn make_decoded(b: &[u8]) -> String {
        String::from_utf8_lossy(b).into_owned()
    }

    fn overflowed(&mut self, src: &mut BytesMut) -> Option<String> {
        // keep a possible partial delimiter so it can still complete
        let keep = usize::from(src.last() == Some(&self.delimiter[0]));
        src.advance(src.len() - keep);

        self.search_from = 0;

        if !self.discarding {
            tracing::warn!(max_length = self.max_length, "discarding overlong line");
            self.discarding = true;
        }

        None
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Encoder<T> for LineCodec
where
    T: AsRef<str>,
{
    type Error = std::io::Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let item = item.as_ref().as_bytes();

        dst.reserve(item.len() + self.delimiter.len());
        dst.put(item);
        dst.put(self.delimiter.as_ref());

        Ok(())
    }
}

impl Decoder for LineCodec {
    type Error = std::io::Error;
    type Item = String;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            return match self.ac.find(&src[self.search_from..]) {
                Some(mat) if mat.end() - mat.start() == self.delimiter.len() => {
                    let mut result = src.split_to(self.search_from + mat.end());
                    self.search_from = 0;

                    result.truncate(result.len() - self.delimiter.len());

                    if std::mem::take(&mut self.discarding) {
                        continue;
                    }

                    if result.len() > self.max_length {
                        tracing::warn!(max_length = self.max_length, "discarding overlong line");
                        continue;
                    }

                    Ok(Some(Self::make_decoded(&result)))
                },
                Some(mat) => {
                    if self.search_from + mat.end() == src.len() {
                        if src.len() > self.max_length + self.delimiter.len() {
                            return Ok(self.overflowed(src));
                        }

                        return Ok(None);
                    }

                    self.search_from += mat.end();
                    continue;
                },
                None => {
                    if src.len() > self.max_length {
                        return Ok(self.overflowed(src));
                    }

                    self.search_from = src.len();
                    Ok(None)
                },
            };
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        self.search_from = 0;

        if buf.is_empty() || std::mem::take(&mut self.discarding) {
            buf.clear();
            return Ok(None);
        }

        Ok(Some(Self::make_decoded(&buf.split())))
    }
}
