use std::{collections::TryReserveError, fmt};

use log::trace;
use thiserror::Error;

/// Delimiter byte that opens and closes an escaped run token
pub const SENTINEL: u8 = b'|';

const DEFAULT_TRIGGERS: &[u8] = b"f0";
const DEFAULT_THRESHOLD: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed encoding at offset {offset}: {reason}")]
    MalformedEncoding { offset: usize, reason: MalformedReason },
    #[error("input contains the sentinel byte '|' at offset {offset}, which cannot be encoded")]
    SentinelInInput { offset: usize },
    #[error("the sentinel byte '|' cannot be a trigger")]
    SentinelTrigger,
    #[error("run of {run} bytes at offset {offset} cannot be allocated")]
    RunTooLarge {
        offset: usize,
        run: usize,
        #[source]
        source: TryReserveError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    MissingRunByte,
    Unterminated,
    MissingLength,
    NonNumericLength,
    LengthOverflow,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            MalformedReason::MissingRunByte => "run token has no representative byte",
            MalformedReason::Unterminated => "run token is not closed by '|'",
            MalformedReason::MissingLength => "run token has no length",
            MalformedReason::NonNumericLength => "run length is not a decimal number",
            MalformedReason::LengthOverflow => "run length does not fit in usize",
        };
        f.write_str(msg)
    }
}

/// Set of byte values whose long runs get escaped
#[derive(Clone, PartialEq, Eq)]
pub struct TriggerSet([bool; 256]);

impl TriggerSet {
    pub fn new(bytes: &[u8]) -> Self {
        let mut table = [false; 256];
        for &b in bytes {
            table[b as usize] = true;
        }
        TriggerSet(table)
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        self.0[byte as usize]
    }

    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |&b| self.contains(b))
    }
}

impl fmt::Debug for TriggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes: Vec<u8> = self.bytes().collect();
        write!(f, "TriggerSet({:?})", String::from_utf8_lossy(&bytes))
    }
}

/// Encoder settings: which bytes may be escaped, and how long a run must be first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleConfig {
    triggers: TriggerSet,
    threshold: usize,
}

impl RleConfig {
    /// Builds a config from the trigger bytes and the exclusive run-length threshold.
    ///
    /// # Errors
    /// Returns `CodecError::SentinelTrigger` if `triggers` contains the sentinel
    pub fn new(triggers: &[u8], threshold: usize) -> Result<Self, CodecError> {
        if triggers.contains(&SENTINEL) {
            return Err(CodecError::SentinelTrigger);
        }
        Ok(RleConfig {
            triggers: TriggerSet::new(triggers),
            threshold,
        })
    }

    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    fn escapes(&self, byte: u8, run: usize) -> bool {
        self.triggers.contains(byte) && run > self.threshold
    }
}

impl Default for RleConfig {
    fn default() -> Self {
        RleConfig {
            triggers: TriggerSet::new(DEFAULT_TRIGGERS),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Encodes `input`, replacing long trigger runs with `|<byte><length>|` tokens
///
/// # Arguments
/// * `input` - Raw bytes to encode. Must not contain the sentinel for the result to round-trip
/// * `config` - Trigger set and threshold
///
/// # Returns
/// The encoded bytes. Runs that are not escaped are copied through verbatim
pub fn encode(input: &[u8], config: &RleConfig) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let byte = input[pos];
        let run = input[pos..].iter().take_while(|&&b| b == byte).count();

        if config.escapes(byte, run) {
            trace!("escaping run of {} x {:?} at {}", run, byte as char, pos);
            encoded.push(SENTINEL);
            encoded.push(byte);
            encoded.extend_from_slice(run.to_string().as_bytes());
            encoded.push(SENTINEL);
        } else {
            encoded.extend_from_slice(&input[pos..pos + run]);
        }
        pos += run;
    }

    encoded
}

/// Decodes data produced by [`encode`]
///
/// # Errors
/// Returns `CodecError::MalformedEncoding` if a run token is truncated, unterminated,
/// or carries a length that is missing, non-numeric, or pushes the output past `usize`.
/// Returns `CodecError::RunTooLarge` if the expanded run cannot be allocated
pub fn decode(encoded: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut decoded = Vec::with_capacity(encoded.len());
    let mut pos = 0;

    while pos < encoded.len() {
        if encoded[pos] != SENTINEL {
            // Copy the literal span up to the next token in one go
            let span = encoded[pos..]
                .iter()
                .position(|&b| b == SENTINEL)
                .unwrap_or(encoded.len() - pos);
            decoded.extend_from_slice(&encoded[pos..pos + span]);
            pos += span;
            continue;
        }

        let (byte, run, consumed) = parse_token(encoded, pos)?;
        trace!("expanding run of {} x {:?} at {}", run, byte as char, pos);
        let new_len = decoded
            .len()
            .checked_add(run)
            .ok_or(CodecError::MalformedEncoding {
                offset: pos,
                reason: MalformedReason::LengthOverflow,
            })?;
        decoded
            .try_reserve(run)
            .map_err(|source| CodecError::RunTooLarge { offset: pos, run, source })?;
        decoded.resize(new_len, byte);
        pos += consumed;
    }

    Ok(decoded)
}

// Parses the token opening at `start`, returning (byte, run length, bytes consumed).
fn parse_token(encoded: &[u8], start: usize) -> Result<(u8, usize, usize), CodecError> {
    let malformed = |reason| CodecError::MalformedEncoding { offset: start, reason };

    let byte = *encoded
        .get(start + 1)
        .ok_or(malformed(MalformedReason::MissingRunByte))?;

    let digits_start = start + 2;
    let close = encoded
        .get(digits_start..)
        .and_then(|rest| rest.iter().position(|&b| b == SENTINEL))
        .map(|i| digits_start + i)
        .ok_or(malformed(MalformedReason::Unterminated))?;

    let digits = &encoded[digits_start..close];
    if digits.is_empty() {
        return Err(malformed(MalformedReason::MissingLength));
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(malformed(MalformedReason::NonNumericLength));
    }

    let run = digits.iter().try_fold(0usize, |acc, &d| {
        acc.checked_mul(10)?.checked_add((d - b'0') as usize)
    });
    let run = run.ok_or(malformed(MalformedReason::LengthOverflow))?;

    Ok((byte, run, close + 1 - start))
}

/// Returns the offset of the first sentinel byte in raw input, if any
pub fn find_sentinel(input: &[u8]) -> Option<usize> {
    input.iter().position(|&b| b == SENTINEL)
}
