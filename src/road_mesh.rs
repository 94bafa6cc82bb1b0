use bevy::{
    prelude::*, render::{render_resource::PrimitiveTopology, mesh::Indices},
};

use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Segment {
    pub a: Vec3,
    pub b: Vec3,
    /// Normal/Up vector of the segment. (usually, the up vector of a car driving on the road)
    pub up: Vec3,
}

/// Compute a triangle's normal
fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> [f32; 3] {
    (b - a).cross(c - a).normalize().into()
}

/// Builds one quad per segment. Each quad's far edge is widened along the
/// next segment's right vector so consecutive quads meet without gaps.
pub fn build_road_mesh(segments: &[Segment], half_width: f32) -> Mesh {
    let mut position_attributes: Vec<[f32; 3]> = Vec::with_capacity(segments.len() * 4);
    let mut normal_attributes: Vec<[f32; 3]> = Vec::with_capacity(segments.len() * 4);
    let mut indices: Vec<u32> = Vec::with_capacity(segments.len() * 6);

    for (index, segment) in segments.iter().enumerate() {
        let i = index as u32;
        let right: Vec3 = (segment.b - segment.a).cross(segment.up).normalize();

        let next_right = match segments.get(index + 1) {
            Some(next) => (next.b - next.a).cross(next.up).normalize(),
            None => right,
        };

        //
        // p3                         p4
        //  +--------------------------+               -> b
        //  |            |             |
        //  |            |             |
        //  +--------------------------+               -> a
        //  p1                         p2
        //
        let p1 = segment.a - right * half_width;
        let p2 = segment.a + right * half_width;
        let p3 = segment.b - next_right * half_width;
        let p4 = segment.b + next_right * half_width;

        position_attributes.extend([p1.to_array(), p2.to_array(), p3.to_array(), p4.to_array()]);

        let normal = face_normal(p1, p2, p3);
        normal_attributes.extend([normal; 4]);

        indices.extend([i * 4, 1 + i * 4, 2 + i * 4]);
        indices.extend([2 + i * 4, 1 + i * 4, 3 + i * 4]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, position_attributes);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normal_attributes);
    mesh.set_indices(Some(Indices::U32(indices)));
    mesh
}

pub fn road_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::rgb(0.9, 0.5, 0.3),
        double_sided: true,
        cull_mode: None,
        ..Default::default()
    }
}
