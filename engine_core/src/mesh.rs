//! Mesh file codec.
//!
//! Little-endian, no header: `u32` index count, the `u32` indices, `u32`
//! vertex count, then the vertices (64 bytes each, see [`Vertex`]).

use std::path::Path;

use anyhow::{bail, Context};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;
use crate::math::{Vec2, Vec3, Vec4};

pub const VERTEX_SIZE: usize = (3 + 3 + 2 + 4) * 4 + 4 * 4;

/// Skinned vertex: position, normal, texcoord, four joint weights and the
/// indices of the joints they refer to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub weights: Vec4,
    pub joints: [i32; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MeshData {
    pub indices: Vec<u32>,
    pub vertices: Vec<Vertex>,
}

impl MeshData {
    pub fn encode(&self) -> Bytes {
        let mut buf =
            BytesMut::with_capacity(8 + self.indices.len() * 4 + self.vertices.len() * VERTEX_SIZE);
        buf.put_u32_le(self.indices.len() as u32);
        for i in &self.indices {
            buf.put_u32_le(*i);
        }
        buf.put_u32_le(self.vertices.len() as u32);
        for v in &self.vertices {
            for f in [v.position.x, v.position.y, v.position.z] {
                buf.put_f32_le(f);
            }
            for f in [v.normal.x, v.normal.y, v.normal.z] {
                buf.put_f32_le(f);
            }
            buf.put_f32_le(v.uv.x);
            buf.put_f32_le(v.uv.y);
            for f in [v.weights.x, v.weights.y, v.weights.z, v.weights.w] {
                buf.put_f32_le(f);
            }
            for j in v.joints {
                buf.put_i32_le(j);
            }
        }
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> anyhow::Result<Self> {
        let mut buf = data;

        let index_count = read_count(&mut buf, 4, "indices")?;
        let mut indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            indices.push(buf.get_u32_le());
        }

        let vertex_count = read_count(&mut buf, VERTEX_SIZE, "vertices")?;
        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let position = Vec3::new(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le());
            let normal = Vec3::new(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le());
            let uv = Vec2::new(buf.get_f32_le(), buf.get_f32_le());
            let weights = Vec4::new(
                buf.get_f32_le(),
                buf.get_f32_le(),
                buf.get_f32_le(),
                buf.get_f32_le(),
            );
            let joints = [
                buf.get_i32_le(),
                buf.get_i32_le(),
                buf.get_i32_le(),
                buf.get_i32_le(),
            ];
            vertices.push(Vertex {
                position,
                normal,
                uv,
                weights,
                joints,
            });
        }

        if let Some(bad) = indices.iter().find(|i| **i as usize >= vertices.len()) {
            bail!("index {} out of range for {} vertices", bad, vertices.len());
        }

        Ok(Self { indices, vertices })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path).with_context(|| format!("open {}", path.display()))?;
        Self::decode(&data).with_context(|| format!("decode {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.encode()).with_context(|| format!("write {}", path.display()))
    }

    /// Converts exporter output to the engine's left-handed frame: mirrors
    /// x, flips texture v and reverses triangle winding.
    pub fn condition_left_handed(&mut self) {
        for v in &mut self.vertices {
            v.position.x = -v.position.x;
            v.normal.x = -v.normal.x;
            v.uv.y = 1.0 - v.uv.y;
        }
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(0, 2);
        }
    }

    /// Tight box around all vertex positions.
    pub fn bounds(&self) -> Option<Aabb> {
        let first = self.vertices.first()?.position;
        let (min, max) = self.vertices.iter().fold((first, first), |(lo, hi), v| {
            let p = v.position;
            (
                Vec3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Vec3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        });
        Some(Aabb::from_min_max(min, max))
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn read_count(buf: &mut &[u8], stride: usize, what: &str) -> anyhow::Result<usize> {
    if buf.remaining() < 4 {
        bail!("truncated mesh data: missing {} count", what);
    }
    let count = buf.get_u32_le() as usize;
    let len = count.saturating_mul(stride);
    if buf.remaining() < len {
        bail!(
            "truncated mesh data: {} {} need {} bytes, {} left",
            count,
            what,
            len,
            buf.remaining()
        );
    }
    Ok(count)
}
