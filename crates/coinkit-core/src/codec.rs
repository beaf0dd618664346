//! Bitcoin-style transaction wire format.
//!
//! ```text
//! version(4 LE) [marker 0x00 flag 0x01]
//! varint(n_in)  { txid(32) index(4 LE) varint(len) script_sig sequence(4 LE) }*
//! varint(n_out) { value(8 LE) varint(len) script_pubkey }*
//! [ per input: varint(n_items) { varint(len) item }* ]
//! lock_time(4 LE)
//! ```
//!
//! The bracketed parts are present only for segwit transactions. The txid
//! always hashes the non-witness encoding, so it does not change when
//! witnesses are attached.

use tracing::trace;

use crate::crypto::double_sha256;
use crate::error::CodecError;
use crate::types::{Hash256, OutPoint, Transaction, TxInput, TxOutput};

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

/// Compact-size unsigned integer.
///
/// `<= 0xfc` is one byte; larger values are a `0xfd`/`0xfe`/`0xff`
/// discriminator followed by 2/4/8 little-endian bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Encoded length in bytes.
    pub fn size(&self) -> usize {
        match self.0 {
            0..=0xfc => 1,
            0xfd..=0xffff => 3,
            0x1_0000..=0xffff_ffff => 5,
            _ => 9,
        }
    }

    pub fn encode_to(&self, out: &mut Vec<u8>) {
        match self.0 {
            0..=0xfc => out.push(self.0 as u8),
            0xfd..=0xffff => {
                out.push(0xfd);
                out.extend_from_slice(&(self.0 as u16).to_le_bytes());
            }
            0x1_0000..=0xffff_ffff => {
                out.push(0xfe);
                out.extend_from_slice(&(self.0 as u32).to_le_bytes());
            }
            _ => {
                out.push(0xff);
                out.extend_from_slice(&self.0.to_le_bytes());
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.encode_to(&mut out);
        out
    }
}

impl From<usize> for VarInt {
    fn from(n: usize) -> Self {
        Self(n as u64)
    }
}

/// Cursor over a byte slice that never reads past the end.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read a varint, rejecting non-minimal encodings.
    pub fn read_varint(&mut self) -> Result<VarInt, CodecError> {
        let (value, min) = match self.read_u8()? {
            0xfd => (self.read_u16()? as u64, 0xfd),
            0xfe => (self.read_u32()? as u64, 0x1_0000),
            0xff => (self.read_u64()?, 0x1_0000_0000),
            n => return Ok(VarInt(n as u64)),
        };
        if value < min {
            return Err(CodecError::NonCanonicalVarInt);
        }
        Ok(VarInt(value))
    }

    /// Read a count of items that each occupy at least one byte.
    fn read_count(&mut self) -> Result<usize, CodecError> {
        let count = self.read_varint()?.0;
        if count > self.remaining() as u64 {
            return Err(CodecError::CountTooLarge {
                count,
                remaining: self.remaining(),
            });
        }
        Ok(count as usize)
    }

    /// Read a varint length prefix followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_count()?;
        Ok(self.read_bytes(len)?.to_vec())
    }
}

fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    VarInt::from(bytes.len()).encode_to(out);
    out.extend_from_slice(bytes);
}

impl OutPoint {
    fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.txid.as_bytes());
        out.extend_from_slice(&self.index.to_le_bytes());
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let txid = Hash256(reader.read_array()?);
        let index = reader.read_u32()?;
        Ok(Self { txid, index })
    }
}

impl TxInput {
    /// Non-witness encoding of this input.
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        self.previous_output.encode_to(out);
        write_var_bytes(out, &self.script_sig);
        out.extend_from_slice(&self.sequence.to_le_bytes());
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let previous_output = OutPoint::decode_from(reader)?;
        let script_sig = reader.read_var_bytes()?;
        let sequence = reader.read_u32()?;
        Ok(Self {
            previous_output,
            script_sig,
            sequence,
            witness: Vec::new(),
        })
    }

    fn encode_witness_to(&self, out: &mut Vec<u8>) {
        VarInt::from(self.witness.len()).encode_to(out);
        for item in &self.witness {
            write_var_bytes(out, item);
        }
    }

    fn decode_witness_from(&mut self, reader: &mut Reader<'_>) -> Result<(), CodecError> {
        let count = reader.read_count()?;
        let mut witness = Vec::with_capacity(count);
        for _ in 0..count {
            witness.push(reader.read_var_bytes()?);
        }
        self.witness = witness;
        Ok(())
    }
}

impl TxOutput {
    pub fn encode_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.value.to_le_bytes());
        write_var_bytes(out, &self.script_pubkey);
    }

    fn decode_from(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let value = reader.read_u64()?;
        let script_pubkey = reader.read_var_bytes()?;
        Ok(Self {
            value,
            script_pubkey,
        })
    }
}

impl Transaction {
    /// Serialize in the encoding selected by `self.segwit`.
    pub fn serialize(&self) -> Vec<u8> {
        self.encode(self.segwit)
    }

    /// Serialize without marker, flag or witnesses.
    pub fn serialize_without_witness(&self) -> Vec<u8> {
        self.encode(false)
    }

    fn encode(&self, with_witness: bool) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.estimated_size());
        out.extend_from_slice(&self.version.to_le_bytes());
        if with_witness {
            out.push(SEGWIT_MARKER);
            out.push(SEGWIT_FLAG);
        }
        VarInt::from(self.inputs.len()).encode_to(&mut out);
        for input in &self.inputs {
            input.encode_to(&mut out);
        }
        VarInt::from(self.outputs.len()).encode_to(&mut out);
        for output in &self.outputs {
            output.encode_to(&mut out);
        }
        if with_witness {
            for input in &self.inputs {
                input.encode_witness_to(&mut out);
            }
        }
        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    fn estimated_size(&self) -> usize {
        let inputs: usize = self.inputs.iter().map(|i| 41 + i.script_sig.len()).sum();
        let outputs: usize = self.outputs.iter().map(|o| 9 + o.script_pubkey.len()).sum();
        10 + inputs + outputs
    }

    /// Serialized bytes as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Parse a complete transaction. Trailing bytes are an error.
    pub fn deserialize(data: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(data);
        let tx = Self::decode_from(&mut reader)?;
        if !reader.is_empty() {
            trace!(trailing = reader.remaining(), "rejecting transaction with trailing bytes");
            return Err(CodecError::TrailingBytes(reader.remaining()));
        }
        Ok(tx)
    }

    /// Parse a transaction from hex.
    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        let bytes = hex::decode(s).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// Parse one transaction from the reader, leaving any following bytes.
    pub fn decode_from(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Self::decode_inner(reader).inspect_err(|e| trace!(error = %e, "transaction decode failed"))
    }

    fn decode_inner(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let version = reader.read_u32()?;

        // A zero input count cannot start a valid transaction, so a 0x00
        // here is the segwit marker.
        let segwit = reader.peek(0) == Some(SEGWIT_MARKER);
        if segwit {
            reader.read_u8()?;
            let flag = reader.read_u8()?;
            if flag != SEGWIT_FLAG {
                return Err(CodecError::InvalidSegwitFlag(flag));
            }
        }

        let n_in = reader.read_count()?;
        let mut inputs = Vec::with_capacity(n_in);
        for _ in 0..n_in {
            inputs.push(TxInput::decode_from(reader)?);
        }

        let n_out = reader.read_count()?;
        let mut outputs = Vec::with_capacity(n_out);
        for _ in 0..n_out {
            outputs.push(TxOutput::decode_from(reader)?);
        }

        if segwit {
            for input in &mut inputs {
                input.decode_witness_from(reader)?;
            }
        }

        let lock_time = reader.read_u32()?;
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
            segwit,
        })
    }

    /// Transaction id: double SHA-256 of the non-witness encoding, in
    /// internal byte order. Display with [`Hash256::to_display_hex`].
    pub fn txid(&self) -> Hash256 {
        Hash256(double_sha256(&self.serialize_without_witness()))
    }

    /// Witness transaction id: hash of the full encoding. Equal to the txid
    /// for non-segwit transactions.
    pub fn wtxid(&self) -> Hash256 {
        Hash256(double_sha256(&self.serialize()))
    }

    /// Serialized size in bytes, in the transaction's own encoding.
    pub fn size(&self) -> usize {
        self.serialize().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_tx(segwit: bool) -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![
                TxInput {
                    previous_output: OutPoint { txid: Hash256([0x11; 32]), index: 1 },
                    script_sig: vec![0xAA; 3],
                    sequence: 0xffff_fffe,
                    witness: if segwit { vec![vec![0x30; 71], vec![0x02; 33]] } else { vec![] },
                },
                TxInput {
                    previous_output: OutPoint { txid: Hash256([0x22; 32]), index: 0 },
                    script_sig: vec![],
                    sequence: u32::MAX,
                    witness: vec![],
                },
            ],
            outputs: vec![
                TxOutput { value: 100_000, script_pubkey: vec![0x76, 0xa9] },
                TxOutput { value: 0, script_pubkey: vec![] },
            ],
            lock_time: 500,
            segwit,
        }
    }

    // --- VarInt ---

    #[test]
    fn varint_boundaries() {
        assert_eq!(VarInt(0).encode(), vec![0x00]);
        assert_eq!(VarInt(0xfc).encode(), vec![0xfc]);
        assert_eq!(VarInt(0xfd).encode(), vec![0xfd, 0xfd, 0x00]);
        assert_eq!(VarInt(0xffff).encode(), vec![0xfd, 0xff, 0xff]);
        assert_eq!(VarInt(0x1_0000).encode(), vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(VarInt(0xffff_ffff).encode(), vec![0xfe, 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(
            VarInt(0x1_0000_0000).encode(),
            vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn varint_size_matches_encoding() {
        for v in [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, u64::MAX] {
            assert_eq!(VarInt(v).size(), VarInt(v).encode().len());
        }
    }

    #[test]
    fn varint_non_canonical_rejected() {
        let mut r = Reader::new(&[0xfd, 0x10, 0x00]);
        assert_eq!(r.read_varint().unwrap_err(), CodecError::NonCanonicalVarInt);
        let mut r = Reader::new(&[0xfe, 0xff, 0xff, 0x00, 0x00]);
        assert_eq!(r.read_varint().unwrap_err(), CodecError::NonCanonicalVarInt);
    }

    #[test]
    fn varint_truncated() {
        let mut r = Reader::new(&[0xfe, 0x01]);
        assert_eq!(
            r.read_varint().unwrap_err(),
            CodecError::UnexpectedEof { needed: 4, remaining: 1 }
        );
    }

    // --- Layout ---

    #[test]
    fn legacy_layout() {
        let tx = sample_tx(false);
        let bytes = tx.serialize();
        assert_eq!(&bytes[..4], &[2, 0, 0, 0]);
        assert_eq!(bytes[4], 2); // input count, no marker
        assert_eq!(&bytes[5..37], &[0x11; 32]);
        assert_eq!(&bytes[37..41], &[1, 0, 0, 0]);
        assert_eq!(&bytes[bytes.len() - 4..], &500u32.to_le_bytes());
    }

    #[test]
    fn segwit_layout() {
        let tx = sample_tx(true);
        let bytes = tx.serialize();
        assert_eq!(&bytes[4..6], &[0x00, 0x01]);
        assert_eq!(bytes[6], 2);
        // witness of input 0 then empty witness of input 1, then lock_time
        let tail = &bytes[bytes.len() - 4 - 1..];
        assert_eq!(tail[0], 0x00);
        assert!(bytes.len() > tx.serialize_without_witness().len());
    }

    #[test]
    fn known_transaction_roundtrip() {
        // Mainnet tx f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16.
        let raw = "0100000001c997a5e56e104102fa209c6a852dd90660a20b2d9c352423edce25857fcd3704000000004847304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd410220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d0901ffffffff0200ca9a3b00000000434104ae1a62fe09c5f51b13905f07f06b99a2f7159b2225f374cd378d71302fa28414e7aab37397f554a7df5f142c21c1b7303b8a0626f1baded5c72a704f7e6cd84cac00286bee0000000043410411db93e1dcdb8a016b49840f8c53bc1eb68a382e97b1482ecad7b148a6909a5cb2e0eaddfb84ccf9744464f82e160bfa9b8b64f9d4c03f999b8643f656b412a3ac00000000";
        let tx = Transaction::from_hex(raw).unwrap();
        assert!(!tx.segwit);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 1_000_000_000);
        assert_eq!(tx.to_hex(), raw);
        assert_eq!(
            tx.txid().to_display_hex(),
            "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16"
        );
    }

    // --- Identifiers ---

    #[test]
    fn txid_ignores_witness() {
        let legacy = sample_tx(false);
        let mut segwit = sample_tx(true);
        assert_eq!(legacy.txid(), segwit.txid());
        segwit.inputs[0].witness[0][0] ^= 0xff;
        assert_eq!(legacy.txid(), segwit.txid());
        assert_ne!(segwit.wtxid(), segwit.txid());
    }

    #[test]
    fn wtxid_equals_txid_without_segwit() {
        let tx = sample_tx(false);
        assert_eq!(tx.wtxid(), tx.txid());
    }

    #[test]
    fn txid_changes_with_data() {
        let tx1 = sample_tx(false);
        let mut tx2 = sample_tx(false);
        tx2.lock_time = 1;
        assert_ne!(tx1.txid(), tx2.txid());
    }

    // --- Malformed input ---

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(
            Transaction::deserialize(&[]),
            Err(CodecError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn every_truncation_rejected() {
        for segwit in [false, true] {
            let bytes = sample_tx(segwit).serialize();
            for len in 0..bytes.len() {
                assert!(
                    Transaction::deserialize(&bytes[..len]).is_err(),
                    "truncation to {len} bytes accepted (segwit={segwit})"
                );
            }
        }
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = sample_tx(false).serialize();
        bytes.push(0);
        assert_eq!(Transaction::deserialize(&bytes).unwrap_err(), CodecError::TrailingBytes(1));
    }

    #[test]
    fn bad_segwit_flag_rejected() {
        let mut bytes = sample_tx(true).serialize();
        bytes[5] = 0x02;
        assert_eq!(
            Transaction::deserialize(&bytes).unwrap_err(),
            CodecError::InvalidSegwitFlag(0x02)
        );
    }

    #[test]
    fn oversized_count_rejected() {
        // version, then an input count far larger than the payload
        let bytes = [1, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff, 0x00];
        assert!(matches!(
            Transaction::deserialize(&bytes),
            Err(CodecError::CountTooLarge { .. })
        ));
    }

    #[test]
    fn invalid_hex_rejected() {
        assert!(matches!(Transaction::from_hex("0g"), Err(CodecError::InvalidHex(_))));
    }

    #[test]
    fn reader_leaves_following_bytes() {
        let tx = sample_tx(true);
        let mut bytes = tx.serialize();
        bytes.extend_from_slice(&[0xde, 0xad]);
        let mut reader = Reader::new(&bytes);
        assert_eq!(Transaction::decode_from(&mut reader).unwrap(), tx);
        assert_eq!(reader.remaining(), 2);
    }

    // --- Round-trip properties ---

    fn arb_input(segwit: bool) -> impl Strategy<Value = TxInput> {
        let witness = if segwit {
            prop::collection::vec(prop::collection::vec(any::<u8>(), 0..80), 0..4).boxed()
        } else {
            Just(Vec::new()).boxed()
        };
        (
            any::<[u8; 32]>(),
            any::<u32>(),
            prop::collection::vec(any::<u8>(), 0..300),
            any::<u32>(),
            witness,
        )
            .prop_map(|(txid, index, script_sig, sequence, witness)| TxInput {
                previous_output: OutPoint { txid: Hash256(txid), index },
                script_sig,
                sequence,
                witness,
            })
    }

    fn arb_output() -> impl Strategy<Value = TxOutput> {
        (any::<u64>(), prop::collection::vec(any::<u8>(), 0..300))
            .prop_map(|(value, script_pubkey)| TxOutput { value, script_pubkey })
    }

    fn arb_tx() -> impl Strategy<Value = Transaction> {
        any::<bool>().prop_flat_map(|segwit| {
            (
                any::<u32>(),
                prop::collection::vec(arb_input(segwit), 1..6),
                prop::collection::vec(arb_output(), 0..6),
                any::<u32>(),
            )
                .prop_map(move |(version, inputs, outputs, lock_time)| Transaction {
                    version,
                    inputs,
                    outputs,
                    lock_time,
                    segwit,
                })
        })
    }

    proptest! {
        #[test]
        fn roundtrip(tx in arb_tx()) {
            let decoded = Transaction::deserialize(&tx.serialize()).unwrap();
            prop_assert_eq!(decoded, tx);
        }

        #[test]
        fn txid_is_witness_independent(tx in arb_tx()) {
            let mut stripped = tx.clone();
            stripped.segwit = false;
            for input in &mut stripped.inputs {
                input.witness.clear();
            }
            prop_assert_eq!(stripped.txid(), tx.txid());
        }

        #[test]
        fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..200)) {
            let _ = Transaction::deserialize(&bytes);
        }
    }
}
