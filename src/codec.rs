// Copyright 2024 Nathan Hoos
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Stream codecs for packed bit matrices.
//!
//! Layout, shared by both encodings: ASCII decimal row count, whitespace,
//! ASCII decimal column count, whitespace, then `R * ceil(C/8)` payload
//! bytes (row-major, little-endian within each 64-bit word) as lowercase
//! hex pairs or RFC 4648 Base64 without line breaks. A trailing newline is
//! tolerated on decode.
//!
//! Decoding builds a fresh matrix and only hands it out on success, so a
//! malformed stream never leaves a half-written value behind. Streams are
//! read as-is; callers wanting buffered file I/O wrap a `BufReader`.

use crate::bitmatrix::BinaryMatrix;
use crate::errors::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::io::{Read, Write};

fn read_one<S: Read>(input: &mut S) -> Result<u8> {
    let mut b = [0u8; 1];
    loop {
        match input.read(&mut b) {
            Ok(0) => {
                return Err(Error::MalformedInput(
                    "unexpected end of stream in header".into(),
                ))
            }
            Ok(_) => return Ok(b[0]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Reads one whitespace-delimited decimal from the header, consuming the
/// single terminator byte after the digits.
fn read_decimal<S: Read>(input: &mut S) -> Result<usize> {
    let mut cur = read_one(input)?;
    while cur.is_ascii_whitespace() {
        cur = read_one(input)?;
    }
    if !cur.is_ascii_digit() {
        return Err(Error::MalformedInput(format!(
            "expected decimal dimension, found byte 0x{:02x}",
            cur
        )));
    }
    let mut value = 0usize;
    while cur.is_ascii_digit() {
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((cur - b'0') as usize))
            .ok_or_else(|| Error::MalformedInput("dimension overflows usize".into()))?;
        cur = read_one(input)?;
    }
    if !cur.is_ascii_whitespace() {
        return Err(Error::MalformedInput(format!(
            "expected whitespace after dimension, found byte 0x{:02x}",
            cur
        )));
    }
    Ok(value)
}

pub(crate) fn check_header<S: Read>(input: &mut S, rows: usize, cols: usize) -> Result<()> {
    let r = read_decimal(input)?;
    let c = read_decimal(input)?;
    if r != rows || c != cols {
        return Err(Error::MalformedInput(format!(
            "header dimensions {}x{} do not match expected {}x{}",
            r, c, rows, cols
        )));
    }
    Ok(())
}

impl<const R: usize, const C: usize> BinaryMatrix<R, C> {
    pub fn to_hex<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{} {}", R, C)?;
        let payload = self.to_packed_bytes();
        for chunk in payload.chunks(1 << 16) {
            out.write_all(hex::encode(chunk).as_bytes())?;
        }
        Ok(())
    }

    pub fn to_base64<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{} {}", R, C)?;
        out.write_all(STANDARD.encode(self.to_packed_bytes()).as_bytes())?;
        Ok(())
    }

    pub fn from_hex<S: Read>(input: &mut S) -> Result<Self> {
        check_header(input, R, C)?;
        let mut encoded = vec![0u8; R * Self::BYTES_PER_ROW * 2];
        input.read_exact(&mut encoded).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::MalformedInput("truncated hex payload".into())
            } else {
                Error::Io(e)
            }
        })?;
        let payload = hex::decode(&encoded)
            .map_err(|e| Error::MalformedInput(format!("bad hex payload: {}", e)))?;
        Ok(Self::from_packed_bytes(&payload))
    }

    pub fn from_base64<S: Read>(input: &mut S) -> Result<Self> {
        check_header(input, R, C)?;
        let mut encoded = Vec::new();
        input.read_to_end(&mut encoded)?;
        while encoded
            .last()
            .is_some_and(|b| b.is_ascii_whitespace())
        {
            encoded.pop();
        }
        let payload = STANDARD
            .decode(&encoded)
            .map_err(|e| Error::MalformedInput(format!("bad base64 payload: {}", e)))?;
        if payload.len() != R * Self::BYTES_PER_ROW {
            return Err(Error::MalformedInput(format!(
                "base64 payload holds {} bytes, expected {}",
                payload.len(),
                R * Self::BYTES_PER_ROW
            )));
        }
        Ok(Self::from_packed_bytes(&payload))
    }
}
