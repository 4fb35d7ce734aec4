//! Binary model snapshots.
//!
//! # Format
//!
//! All integers are little-endian; counts, positions and string lengths use the
//! 7-bit variable-length encoding; strings are UTF-8.
//!
//! ```text
//! magic        "ELGM"
//! version      u16
//! properties   model client properties
//! vertices     count, then per vertex: x y z width height depth (i32), cost (f64),
//!              label, properties
//! edges        count, then per edge: source, target (vertex positions),
//!              directed (u8), cost (f64), label, properties
//! adjacency    per vertex: count, then adjacent vertex positions
//! digest       SHA-1 of every preceding byte (20 bytes)
//! ```
//!
//! A property block is a count followed by `key`, a [`PropertyTag`] byte and the
//! value per entry.
//!
//! Reading rebuilds the model through its public mutation API inside a single
//! transaction, so a snapshot can never produce a model that violates the model's
//! invariants. The stored adjacency table is checked against the one the rebuild
//! produces.

use std::io::{Read, Write};
use std::sync::Arc;

use sha1::{Digest, Sha1};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::{
    file::{
        io::{write_7bit_encoded_int, write_le, write_prefixed_bytes, write_prefixed_string_utf8},
        parser::Parser,
    },
    model::{Edge, GraphModel, PropertyTag, PropertyValue, Vertex},
    Error, Result,
};

/// Leading bytes of every snapshot.
pub const MAGIC: [u8; 4] = *b"ELGM";

/// Format version written by this crate.
pub const VERSION: u16 = 1;

const DIGEST_LEN: usize = 20;

/// Serializes `model` and writes it to `writer`.
///
/// # Errors
///
/// Returns [`Error::FileError`] if writing fails.
pub fn write_model<W: Write>(model: &GraphModel, writer: &mut W) -> Result<()> {
    let bytes = encode_model(model)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Reads a snapshot from `reader` and rebuilds the model.
///
/// With `verify_checksum` unset the digest is skipped but must still be present.
///
/// # Errors
///
/// * [`Error::FileError`] if reading fails
/// * [`Error::ChecksumMismatch`] if the digest does not match
/// * [`Error::Malformed`] / [`Error::OutOfBounds`] if the content is damaged
pub fn read_model<R: Read>(reader: &mut R, verify_checksum: bool) -> Result<Arc<GraphModel>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_model(&bytes, verify_checksum)
}

/// Serializes `model` into a new buffer, digest included.
///
/// # Errors
///
/// Returns [`Error::IllegalArgument`] if a string or byte value is too long to
/// encode.
pub fn encode_model(model: &GraphModel) -> Result<Vec<u8>> {
    let vertices = model.vertices();
    let edges = model.edges();
    let adjacency = model.adjacency_table();

    let mut buffer = Vec::new();
    buffer.extend_from_slice(&MAGIC);
    write_le(&mut buffer, VERSION);
    write_properties(&mut buffer, &model.client_properties())?;

    write_count(&mut buffer, vertices.len())?;
    for vertex in &vertices {
        for value in [
            vertex.x(),
            vertex.y(),
            vertex.z(),
            vertex.width(),
            vertex.height(),
            vertex.depth(),
        ] {
            write_le(&mut buffer, value);
        }
        write_le(&mut buffer, vertex.cost());
        write_prefixed_string_utf8(&mut buffer, &vertex.label())?;
        write_properties(&mut buffer, &vertex.client_properties())?;
    }

    write_count(&mut buffer, edges.len())?;
    for edge in &edges {
        let (Some(source), Some(target)) = (
            position_of(&vertices, edge.source()),
            position_of(&vertices, edge.target()),
        ) else {
            return Err(state_error!("edge {} has endpoints outside the model", edge));
        };
        write_count(&mut buffer, source)?;
        write_count(&mut buffer, target)?;
        write_le(&mut buffer, u8::from(edge.is_directed()));
        write_le(&mut buffer, edge.cost());
        write_prefixed_string_utf8(&mut buffer, &edge.label())?;
        write_properties(&mut buffer, &edge.client_properties())?;
    }

    for list in &adjacency {
        write_count(&mut buffer, list.len())?;
        for &position in list {
            write_count(&mut buffer, position)?;
        }
    }

    let digest = Sha1::digest(&buffer);
    buffer.extend_from_slice(&digest);

    debug!(
        vertices = vertices.len(),
        edges = edges.len(),
        bytes = buffer.len(),
        "encoded model snapshot"
    );
    Ok(buffer)
}

/// Rebuilds a model from snapshot bytes.
///
/// # Errors
///
/// As [`read_model`], minus I/O failures.
pub fn decode_model(bytes: &[u8], verify_checksum: bool) -> Result<Arc<GraphModel>> {
    let Some(body_len) = bytes.len().checked_sub(DIGEST_LEN) else {
        return Err(Error::OutOfBounds);
    };
    let (body, digest) = bytes.split_at(body_len);
    if verify_checksum && Sha1::digest(body).as_slice() != digest {
        return Err(Error::ChecksumMismatch);
    }

    let mut parser = Parser::new(body);
    if parser.read_bytes(MAGIC.len())? != MAGIC {
        return Err(malformed_error!("not a model snapshot"));
    }
    let version = parser.read_le::<u16>()?;
    if version != VERSION {
        return Err(malformed_error!("unsupported snapshot version {}", version));
    }

    let model_properties = read_properties(&mut parser)?;

    let vertex_count = parser.read_count()?;
    let mut vertices = Vec::with_capacity(vertex_count.min(parser.remaining()));
    for _ in 0..vertex_count {
        vertices.push(read_vertex(&mut parser)?);
    }

    let edge_count = parser.read_count()?;
    let mut edges = Vec::with_capacity(edge_count.min(parser.remaining()));
    for _ in 0..edge_count {
        edges.push(read_edge(&mut parser, &vertices)?);
    }

    let mut adjacency = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let len = parser.read_count()?;
        let mut list = Vec::with_capacity(len.min(parser.remaining()));
        for _ in 0..len {
            list.push(parser.read_count()?);
        }
        adjacency.push(list);
    }

    if parser.has_more_data() {
        return Err(malformed_error!(
            "{} trailing bytes after adjacency table at offset {}",
            parser.remaining(),
            parser.pos()
        ));
    }

    let model = GraphModel::new();
    for (key, value) in model_properties {
        model.put_client_property(&key, Some(value));
    }
    rebuild(&model, vertices, edges)?;

    if !same_adjacency(&model.adjacency_table(), &adjacency) {
        return Err(malformed_error!("adjacency table does not match edge list"));
    }

    debug!(
        vertices = vertex_count,
        edges = edge_count,
        "decoded model snapshot"
    );
    Ok(model)
}

fn rebuild(model: &GraphModel, vertices: Vec<Arc<Vertex>>, edges: Vec<Arc<Edge>>) -> Result<()> {
    model.start_transaction()?;
    let populate = || -> Result<()> {
        for vertex in vertices {
            model.add_vertex(vertex)?;
        }
        for edge in edges {
            model.add_edge(edge)?;
        }
        Ok(())
    };

    match populate() {
        Ok(()) => model.end_transaction(),
        Err(error) => {
            model.cancel_transaction()?;
            Err(malformed_error!("snapshot violates model invariants: {}", error))
        }
    }
}

fn read_vertex(parser: &mut Parser<'_>) -> Result<Arc<Vertex>> {
    let x = parser.read_le::<i32>()?;
    let y = parser.read_le::<i32>()?;
    let z = parser.read_le::<i32>()?;
    let width = parser.read_le::<i32>()?;
    let height = parser.read_le::<i32>()?;
    let depth = parser.read_le::<i32>()?;
    let cost = parser.read_le::<f64>()?;
    let label = parser.read_prefixed_string_utf8()?;
    let properties = read_properties(parser)?;

    let vertex = Vertex::new(x, y, z);
    vertex.set_width(width);
    vertex.set_height(height);
    vertex.set_depth(depth);
    vertex.set_cost(cost);
    vertex.set_label(label);
    for (key, value) in properties {
        vertex.put_client_property(&key, Some(value));
    }
    Ok(Arc::new(vertex))
}

fn read_edge(parser: &mut Parser<'_>, vertices: &[Arc<Vertex>]) -> Result<Arc<Edge>> {
    let source = parser.read_count()?;
    let target = parser.read_count()?;
    let directed = parser.read_bool()?;
    let cost = parser.read_le::<f64>()?;
    let label = parser.read_prefixed_string_utf8()?;
    let properties = read_properties(parser)?;

    let endpoint = |position: usize| {
        vertices.get(position).cloned().ok_or_else(|| {
            malformed_error!(
                "edge endpoint {} out of range for {} vertices",
                position,
                vertices.len()
            )
        })
    };

    let edge = Edge::new(endpoint(source)?, endpoint(target)?, directed);
    edge.set_cost(cost);
    edge.set_label(label);
    for (key, value) in properties {
        edge.put_client_property(&key, Some(value));
    }
    Ok(Arc::new(edge))
}

fn write_properties(buffer: &mut Vec<u8>, properties: &[(String, PropertyValue)]) -> Result<()> {
    write_count(buffer, properties.len())?;
    for (key, value) in properties {
        write_prefixed_string_utf8(buffer, key)?;
        write_le(buffer, value.tag() as u8);
        match value {
            PropertyValue::Bool(flag) => write_le(buffer, u8::from(*flag)),
            PropertyValue::Int(number) => write_le(buffer, *number),
            PropertyValue::Float(number) => write_le(buffer, *number),
            PropertyValue::Text(text) => write_prefixed_string_utf8(buffer, text)?,
            PropertyValue::Bytes(bytes) => write_prefixed_bytes(buffer, bytes)?,
        }
    }
    Ok(())
}

fn read_properties(parser: &mut Parser<'_>) -> Result<Vec<(String, PropertyValue)>> {
    let count = parser.read_count()?;
    let mut properties = Vec::with_capacity(count.min(parser.remaining()));
    for _ in 0..count {
        let key = parser.read_prefixed_string_utf8()?;
        let raw = parser.read_le::<u8>()?;
        let tag = PropertyTag::iter()
            .find(|tag| *tag as u8 == raw)
            .ok_or_else(|| malformed_error!("unknown property tag {} for key '{}'", raw, key))?;
        let value = match tag {
            PropertyTag::Bool => PropertyValue::Bool(parser.read_bool()?),
            PropertyTag::Int => PropertyValue::Int(parser.read_le::<i64>()?),
            PropertyTag::Float => PropertyValue::Float(parser.read_le::<f64>()?),
            PropertyTag::Text => PropertyValue::Text(parser.read_prefixed_string_utf8()?),
            PropertyTag::Bytes => PropertyValue::Bytes(parser.read_prefixed_bytes()?.to_vec()),
        };
        properties.push((key, value));
    }
    Ok(properties)
}

fn write_count(buffer: &mut Vec<u8>, count: usize) -> Result<()> {
    let count = u32::try_from(count)
        .map_err(|_| argument_error!("{} exceeds the snapshot count limit", count))?;
    write_7bit_encoded_int(buffer, count);
    Ok(())
}

fn position_of(vertices: &[Arc<Vertex>], vertex: &Vertex) -> Option<usize> {
    vertices.iter().position(|v| **v == *vertex)
}

/// Compares adjacency tables ignoring the order within each list.
fn same_adjacency(rebuilt: &[Vec<usize>], stored: &[Vec<usize>]) -> bool {
    rebuilt.len() == stored.len()
        && rebuilt.iter().zip(stored).all(|(left, right)| {
            let mut left = left.clone();
            let mut right = right.clone();
            left.sort_unstable();
            right.sort_unstable();
            left == right
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::names;

    fn sample_model() -> Arc<GraphModel> {
        let model = GraphModel::new();
        let a = Arc::new(Vertex::new(0, 0, 0));
        let b = Arc::new(Vertex::new(100, 50, 2));
        let c = Arc::new(Vertex::new(-40, 10, 0));
        a.set_label("start");
        b.set_width(20);
        b.set_cost(2.5);
        c.put_client_property("visited", Some(true.into()));

        let ab = Arc::new(Edge::new(Arc::clone(&a), Arc::clone(&b), false));
        ab.set_cost(7.25);
        ab.set_label("main");
        ab.put_client_property("payload", Some(vec![1u8, 2, 3].into()));
        let cb = Arc::new(Edge::new(Arc::clone(&c), Arc::clone(&b), true));

        model.put_client_property(names::DIRECTED, Some(false.into()));
        model.put_client_property("title", Some("sample".into()));
        model.start_transaction().unwrap();
        for v in [a, b, c] {
            model.add_vertex(v).unwrap();
        }
        model.add_edge(ab).unwrap();
        model.add_edge(cb).unwrap();
        model.end_transaction().unwrap();
        model
    }

    #[test]
    fn test_round_trip() {
        let model = sample_model();
        let mut bytes = Vec::new();
        write_model(&model, &mut bytes).unwrap();
        let restored = read_model(&mut bytes.as_slice(), true).unwrap();

        assert_eq!(restored.vertex_count(), 3);
        assert_eq!(restored.edge_count(), 2);
        assert_eq!(restored.adjacency_table(), model.adjacency_table());
        assert_eq!(restored.client_properties(), model.client_properties());

        let vertices = restored.vertices();
        assert_eq!(vertices[0].label(), "start");
        assert_eq!(vertices[1].width(), 20);
        assert_eq!(vertices[1].cost(), 2.5);
        assert_eq!(vertices[1].z(), 2);
        assert_eq!(
            vertices[2].client_property("visited"),
            Some(PropertyValue::Bool(true))
        );
        assert!(vertices
            .iter()
            .all(|v| v.model().is_some_and(|m| Arc::ptr_eq(&m, &restored))));

        let edges = restored.edges();
        assert!(!edges[0].is_directed());
        assert_eq!(edges[0].cost(), 7.25);
        assert_eq!(edges[0].label(), "main");
        assert_eq!(
            edges[0].client_property("payload"),
            Some(PropertyValue::Bytes(vec![1, 2, 3]))
        );
        assert!(edges[1].is_directed());
        assert!(Arc::ptr_eq(edges[1].source(), &vertices[2]));
        assert!(Arc::ptr_eq(edges[1].target(), &vertices[1]));
        assert!(!restored.is_in_transaction());
    }

    #[test]
    fn test_empty_model() {
        let bytes = encode_model(&GraphModel::new()).unwrap();
        assert_eq!(&bytes[..4], &MAGIC);
        let restored = decode_model(&bytes, true).unwrap();
        assert_eq!(restored.vertex_count(), 0);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut bytes = encode_model(&sample_model()).unwrap();
        bytes[8] ^= 0xFF;
        assert!(matches!(
            decode_model(&bytes, true),
            Err(Error::ChecksumMismatch)
        ));
    }

    #[test]
    fn test_bad_magic_and_version() {
        let mut bytes = encode_model(&GraphModel::new()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            decode_model(&bytes, false),
            Err(Error::Malformed { .. })
        ));

        let mut bytes = encode_model(&GraphModel::new()).unwrap();
        bytes[4] = 9;
        assert!(matches!(
            decode_model(&bytes, false),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_reported_with_offset() {
        let mut bytes = encode_model(&GraphModel::new()).unwrap();
        let body_len = bytes.len() - DIGEST_LEN;
        let digest = bytes.split_off(body_len);
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        bytes.extend_from_slice(&digest);

        let error = decode_model(&bytes, false).unwrap_err();
        assert!(matches!(error, Error::Malformed { .. }));
        assert!(error.to_string().contains("2 trailing bytes"));
        assert!(error.to_string().contains(&format!("offset {body_len}")));
    }

    #[test]
    fn test_truncated() {
        let bytes = encode_model(&sample_model()).unwrap();
        assert!(decode_model(&bytes[..10], true).is_err());
        assert!(matches!(decode_model(&bytes[..5], false), Err(Error::OutOfBounds)));
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut body = Vec::new();
        body.extend_from_slice(&MAGIC);
        write_le(&mut body, VERSION);
        write_count(&mut body, 0).unwrap();
        write_count(&mut body, 1).unwrap();
        for value in [0i32, 0, 0, 10, 10, 1] {
            write_le(&mut body, value);
        }
        write_le(&mut body, 0.0f64);
        write_prefixed_string_utf8(&mut body, "").unwrap();
        write_count(&mut body, 0).unwrap();
        write_count(&mut body, 1).unwrap();
        write_count(&mut body, 0).unwrap();
        write_count(&mut body, 0).unwrap();
        write_le(&mut body, 1u8);
        write_le(&mut body, 0.0f64);
        write_prefixed_string_utf8(&mut body, "").unwrap();
        write_count(&mut body, 0).unwrap();
        write_count(&mut body, 1).unwrap();
        write_count(&mut body, 0).unwrap();
        body.extend_from_slice(&[0u8; DIGEST_LEN]);

        let error = decode_model(&body, false).unwrap_err();
        assert!(error.to_string().contains("model invariants"));
    }
}
