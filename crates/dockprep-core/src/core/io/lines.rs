use std::borrow::Cow;
use std::io::{self, BufRead};

/// Line iterator that tolerates bytes outside UTF-8.
///
/// Each item is the line without its terminator, plus whether any bytes had to be replaced.
pub(crate) struct LossyLines<'a, R: BufRead> {
    reader: &'a mut R,
    buf: Vec<u8>,
}

impl<'a, R: BufRead> LossyLines<'a, R> {
    pub(crate) fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for LossyLines<'_, R> {
    type Item = io::Result<(String, bool)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                let line = match String::from_utf8_lossy(&self.buf) {
                    Cow::Borrowed(text) => (text.to_string(), false),
                    Cow::Owned(text) => (text, true),
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn strips_terminators_and_flags_replaced_bytes() {
        let mut reader = Cursor::new(b"first\r\nM\xfcller\nlast".to_vec());
        let lines: Vec<_> = LossyLines::new(&mut reader)
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            lines,
            vec![
                ("first".to_string(), false),
                ("M\u{FFFD}ller".to_string(), true),
                ("last".to_string(), false),
            ]
        );
    }
}
