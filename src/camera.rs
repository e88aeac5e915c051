//! Perspective-warped display mesh.
//!
//! The display surface is mapped onto a regular grid; every frame the grid
//! vertices are translated, scaled, rotated (Z, then Y, then X) and
//! perspective-divided around the camera origin. Recomputation is skipped
//! while the pose is unchanged.

use crate::params::Params;

pub const GRID_DIVISIONS: usize = 32;
pub const GRID_VERTS: usize = (GRID_DIVISIONS + 1) * (GRID_DIVISIONS + 1);

#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    /// Untransformed positions; the grid extends `padding` beyond each edge.
    pub vertices: Vec<[f32; 2]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub fn new(w: f32, h: f32, padding: f32) -> Self {
        let pad_w = w * padding;
        let pad_h = h * padding;
        let divisions = GRID_DIVISIONS as f32;
        let mut vertices = Vec::with_capacity(GRID_VERTS);
        let mut uvs = Vec::with_capacity(GRID_VERTS);
        for row in 0..=GRID_DIVISIONS {
            let v = row as f32 / divisions;
            let y = -pad_h + v * (h + 2.0 * pad_h);
            for col in 0..=GRID_DIVISIONS {
                let u = col as f32 / divisions;
                vertices.push([-pad_w + u * (w + 2.0 * pad_w), y]);
                uvs.push([u, v]);
            }
        }

        let stride = (GRID_DIVISIONS + 1) as u32;
        let mut indices = Vec::with_capacity(GRID_DIVISIONS * GRID_DIVISIONS * 6);
        for row in 0..GRID_DIVISIONS as u32 {
            for col in 0..GRID_DIVISIONS as u32 {
                let tl = row * stride + col;
                let tr = tl + 1;
                let bl = tl + stride;
                let br = bl + 1;
                indices.extend_from_slice(&[tl, tr, br, tl, br, bl]);
            }
        }

        Self {
            vertices,
            uvs,
            indices,
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|tri| [tri[0] as usize, tri[1] as usize, tri[2] as usize])
    }
}

/// Every parameter that affects projected vertex positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub perspective: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub rotate_z: f32,
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    /// Tweened zoom times the pointer contribution. Wheel zoom is applied
    /// about the cursor by the compositor, not here.
    pub zoom: f32,
    pub focus_target_x: f32,
    pub focus_target_y: f32,
    pub focus_strength: f32,
}

impl CameraPose {
    pub fn from_params(params: &Params) -> Self {
        Self {
            perspective: params.perspective,
            rotate_x: params.rotate_x,
            rotate_y: params.rotate_y,
            rotate_z: params.rotate_z,
            scale: params.scale,
            translate_x: params.translate_x + params.mouse_translate_x,
            translate_y: params.translate_y + params.mouse_translate_y,
            origin_x: params.origin_x,
            origin_y: params.origin_y,
            zoom: params.zoom * params.mouse_zoom,
            focus_target_x: params.focus_target_x,
            focus_target_y: params.focus_target_y,
            focus_strength: params.focus_strength,
        }
    }
}

/// Project `base` into `out` for a `w`×`h` content area.
pub fn compute_camera_vertices(
    w: f32,
    h: f32,
    pose: &CameraPose,
    base: &[[f32; 2]],
    out: &mut Vec<[f32; 2]>,
) {
    let ox = pose.origin_x / 100.0 * w;
    let oy = pose.origin_y / 100.0 * h;
    let focus_x = if pose.focus_target_x > 0.0 {
        (w / 2.0 - pose.focus_target_x) * pose.focus_strength
    } else {
        0.0
    };
    let focus_y = if pose.focus_target_y > 0.0 {
        (h / 2.0 - pose.focus_target_y) * pose.focus_strength
    } else {
        0.0
    };
    let tx = pose.translate_x / 100.0 * w + focus_x;
    let ty = pose.translate_y / 100.0 * h + focus_y;
    let (srz, crz) = pose.rotate_z.to_radians().sin_cos();
    let (sry, cry) = pose.rotate_y.to_radians().sin_cos();
    let (srx, crx) = pose.rotate_x.to_radians().sin_cos();
    let k = pose.scale * pose.zoom;

    out.clear();
    out.extend(base.iter().map(|&[bx, by]| {
        let x = (bx - ox + tx) * k;
        let y = (by - oy + ty) * k;

        let (x, y) = (x * crz - y * srz, x * srz + y * crz);
        let (x, z) = (x * cry, -x * sry);
        let (y, z) = (y * crx - z * srx, y * srx + z * crx);

        let f = if pose.perspective > 0.0 {
            pose.perspective / (pose.perspective - z)
        } else {
            1.0
        };
        [x * f + ox, y * f + oy]
    }));
}

#[derive(Debug, Clone)]
pub struct Camera {
    geometry: MeshGeometry,
    projected: Vec<[f32; 2]>,
    last_pose: Option<CameraPose>,
    w: f32,
    h: f32,
}

impl Camera {
    pub fn new(w: f32, h: f32, padding: f32) -> Self {
        let geometry = MeshGeometry::new(w, h, padding);
        Self {
            projected: geometry.vertices.clone(),
            geometry,
            last_pose: None,
            w,
            h,
        }
    }

    pub fn resize(&mut self, w: f32, h: f32, padding: f32) {
        *self = Self::new(w, h, padding);
    }

    /// Reproject if the pose changed. Returns whether vertices moved.
    pub fn update(&mut self, params: &Params) -> bool {
        let pose = CameraPose::from_params(params);
        if self.last_pose == Some(pose) {
            return false;
        }
        compute_camera_vertices(
            self.w,
            self.h,
            &pose,
            &self.geometry.vertices,
            &mut self.projected,
        );
        self.last_pose = Some(pose);
        true
    }

    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    pub fn projected(&self) -> &[[f32; 2]] {
        &self.projected
    }

    pub fn size(&self) -> (f32, f32) {
        (self.w, self.h)
    }
}
