//! Flattens a parsed mesh into one upload-ready vertex stream.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::{
    error::{AssetError, AssetResult, Attribute, ErrorKind},
    material::MaterialAttributes,
    obj::ObjMesh,
};

/// Vertex record: position + uv + normal + material coefficients.
///
/// 3 + 2 + 3 + 15 = 23 floats (92 bytes) per vertex, so one triangle is
/// 69 floats. The material block is Ns, Ka, Kd, Ks, Ke, Ni, d in that order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct InterleavedVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
    pub material: [f32; MaterialAttributes::FLOATS],
}

impl InterleavedVertex {
    /// Floats per record.
    pub const FLOATS: usize = size_of::<Self>() / size_of::<f32>();
    /// Bytes per record.
    pub const STRIDE: usize = size_of::<Self>();

    pub const POSITION_OFFSET: usize = offset_of!(Self, position);
    pub const TEX_COORD_OFFSET: usize = offset_of!(Self, tex_coord);
    pub const NORMAL_OFFSET: usize = offset_of!(Self, normal);
    pub const MATERIAL_OFFSET: usize = offset_of!(Self, material);
}

/// Triangle-ordered vertex stream, three records per triangle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterleavedBuffer {
    vertices: Vec<InterleavedVertex>,
}

impl InterleavedBuffer {
    pub fn vertices(&self) -> &[InterleavedVertex] {
        &self.vertices
    }

    /// The buffer as one flat float sequence.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn into_floats(self) -> Vec<f32> {
        self.as_floats().to_vec()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Emits position, uv, normal and material for every corner of every face,
/// in face order then corner order. No reordering and no deduplication.
pub fn interleave(mesh: &ObjMesh) -> AssetResult<InterleavedBuffer> {
    let mut vertices = Vec::with_capacity(mesh.faces.len() * 3);

    for face in &mesh.faces {
        let fail = |kind: ErrorKind| AssetError::at(&mesh.source, face.line, kind);

        let material = match face.material.as_deref() {
            Some(name) => mesh.materials.lookup(name).map_err(fail)?,
            None => return Err(fail(ErrorKind::MaterialNotFound { name: None })),
        };
        let material = material.to_array();

        for corner in &face.vertices {
            let position =
                fetch(&mesh.positions, corner.position, Attribute::Position).map_err(fail)?;
            let tex_coord =
                fetch(&mesh.tex_coords, corner.tex_coord, Attribute::TexCoord).map_err(fail)?;
            let normal = fetch(&mesh.normals, corner.normal, Attribute::Normal).map_err(fail)?;
            vertices.push(InterleavedVertex {
                position: position.to_array(),
                tex_coord: tex_coord.to_array(),
                normal: normal.to_array(),
                material,
            });
        }
    }

    Ok(InterleavedBuffer { vertices })
}

fn fetch<T: Copy>(pool: &[T], index: usize, attribute: Attribute) -> Result<T, ErrorKind> {
    index
        .checked_sub(1)
        .and_then(|i| pool.get(i).copied())
        .ok_or(ErrorKind::IndexOutOfRange {
            attribute,
            index: index as i64,
            len: pool.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{material::load_mtl_from_str, obj::load_obj_from_str};

    const BLUE_MTL: &str = "\
newmtl Blue
Ns 250.0
Ka 0 0 0
Kd 0.1486 0.1460 0.8001
Ks 0 0 0
Ke 0 0 0
Ni 1.0
d 1.0
illum 1
";

    fn mesh_with(obj: &str, mtl: &str) -> ObjMesh {
        let mut mesh = load_obj_from_str(obj).expect("parse obj");
        mesh.materials = load_mtl_from_str(mtl).expect("parse mtl");
        mesh
    }

    #[test]
    fn layout_matches_record_order() {
        assert_eq!(InterleavedVertex::FLOATS, 23);
        assert_eq!(InterleavedVertex::FLOATS, 8 + MaterialAttributes::FLOATS);
        assert_eq!(InterleavedVertex::STRIDE, 92);
        assert_eq!(InterleavedVertex::STRIDE, InterleavedVertex::FLOATS * 4);
        assert_eq!(InterleavedVertex::POSITION_OFFSET, 0);
        assert_eq!(InterleavedVertex::TEX_COORD_OFFSET, 12);
        assert_eq!(InterleavedVertex::NORMAL_OFFSET, 20);
        assert_eq!(InterleavedVertex::MATERIAL_OFFSET, 32);
    }

    #[test]
    fn single_triangle_round_trip() {
        let obj = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.25 0.5
vt 1 0
vt 0 1
vn 0 0 1
usemtl Blue
f 1/1/1 2/2/1 3/3/1
";
        let buffer = interleave(&mesh_with(obj, BLUE_MTL)).expect("interleave");
        let floats = buffer.as_floats();
        assert_eq!(buffer.triangle_count(), 1);
        assert_eq!(floats.len(), 3 * InterleavedVertex::FLOATS);

        let material: [f32; MaterialAttributes::FLOATS] = [
            250.0, 0.0, 0.0, 0.0, 0.1486, 0.1460, 0.8001, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0,
        ];
        let corners: [([f32; 3], [f32; 2]); 3] = [
            ([0.0, 0.0, 0.0], [0.25, 0.5]),
            ([1.0, 0.0, 0.0], [1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 1.0]),
        ];
        for (record, (position, uv)) in floats
            .chunks_exact(InterleavedVertex::FLOATS)
            .zip(corners)
        {
            assert_eq!(&record[0..3], &position);
            assert_eq!(&record[3..5], &uv);
            assert_eq!(&record[5..8], &[0.0, 0.0, 1.0]);
            assert_eq!(&record[8..], &material);
        }
    }

    #[test]
    fn faces_keep_file_order_and_their_own_material() {
        let obj = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vn 0 0 1
usemtl Blue
f 1/1/1 2/1/1 3/1/1 4/1/1
usemtl Red
f 4/1/1 3/1/1 2/1/1
";
        let red = BLUE_MTL.replace("Blue", "Red").replace("250.0", "8.0");
        let mtl = format!("{BLUE_MTL}{red}");
        let buffer = interleave(&mesh_with(obj, &mtl)).expect("interleave");
        assert_eq!(buffer.triangle_count(), 3);

        let xs: Vec<_> = buffer
            .vertices()
            .iter()
            .map(|v| v.position[0..2].to_vec())
            .collect();
        assert_eq!(
            xs,
            vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![1.0, 1.0],
                vec![0.0, 0.0],
                vec![1.0, 1.0],
                vec![0.0, 1.0],
                vec![0.0, 1.0],
                vec![1.0, 1.0],
                vec![1.0, 0.0],
            ]
        );
        let shininess: Vec<f32> = buffer.vertices().iter().map(|v| v.material[0]).collect();
        assert_eq!(shininess, [250.0, 250.0, 250.0, 250.0, 250.0, 250.0, 8.0, 8.0, 8.0]);
    }

    #[test]
    fn index_past_pool_end_is_out_of_range() {
        let obj = "v 0 0 0\nvt 0 0\nvn 0 0 1\nusemtl Blue\nf 1/1/1 1/1/1 1/1/2\n";
        let err = interleave(&mesh_with(obj, BLUE_MTL)).expect_err("normal 2 missing");
        assert_eq!(err.line, Some(5));
        assert!(matches!(
            err.kind(),
            ErrorKind::IndexOutOfRange {
                attribute: Attribute::Normal,
                index: 2,
                len: 1
            }
        ));
    }

    #[test]
    fn face_without_usemtl_is_material_not_found() {
        let obj = "v 0 0 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 1/1/1 1/1/1\n";
        let err = interleave(&mesh_with(obj, BLUE_MTL)).expect_err("no usemtl");
        assert_eq!(err.line, Some(4));
        assert!(matches!(err.kind(), ErrorKind::MaterialNotFound { name: None }));
    }

    #[test]
    fn unknown_material_is_material_not_found() {
        let obj = "v 0 0 0\nvt 0 0\nvn 0 0 1\nusemtl Green\nf 1/1/1 1/1/1 1/1/1\n";
        let err = interleave(&mesh_with(obj, BLUE_MTL)).expect_err("Green missing");
        assert!(matches!(
            err.kind(),
            ErrorKind::MaterialNotFound { name: Some(n) } if n == "Green"
        ));
    }

    #[test]
    fn byte_view_covers_every_float() {
        let obj = "v 0 0 0\nvt 0 0\nvn 0 0 1\nusemtl Blue\nf 1/1/1 1/1/1 1/1/1\n";
        let buffer = interleave(&mesh_with(obj, BLUE_MTL)).unwrap();
        assert_eq!(buffer.as_bytes().len(), 3 * InterleavedVertex::STRIDE);
        assert_eq!(buffer.clone().into_floats(), buffer.as_floats());
    }
}
