/// Homogeneous clipping against the six canonical frustum planes.
///
/// Each plane pass walks the current worklist and writes survivors into the
/// other ping-pong array. A triangle straddling a plane becomes one triangle
/// (one vertex inside) or a quad split into two (two vertices inside).
use super::vertex::ClipTriangle;
use glam::{Vec2, Vec4};

/// Worst case for 6 planes is well under this; extra outputs are dropped.
pub const MAX_CLIPPED_TRIANGLES: usize = 64;

/// Canonical clip planes of the `-w <= x, y, z <= w` volume.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClipPlane {
    Near,
    Far,
    Left,
    Right,
    Bottom,
    Top,
}

impl ClipPlane {
    pub const ALL: [ClipPlane; 6] = [
        ClipPlane::Near,
        ClipPlane::Far,
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
    ];

    /// Signed distance; `>= 0` is inside.
    #[inline(always)]
    pub fn distance(self, p: Vec4) -> f32 {
        match self {
            ClipPlane::Near => p.z + p.w,
            ClipPlane::Far => p.w - p.z,
            ClipPlane::Left => p.x + p.w,
            ClipPlane::Right => p.w - p.x,
            ClipPlane::Bottom => p.y + p.w,
            ClipPlane::Top => p.w - p.y,
        }
    }
}

/// Fixed-capacity triangle list used as a clipping worklist.
#[derive(Clone)]
pub struct ClipList {
    triangles: [ClipTriangle; MAX_CLIPPED_TRIANGLES],
    count: usize,
}

impl Default for ClipList {
    fn default() -> Self {
        Self {
            triangles: [ClipTriangle {
                positions: [Vec4::ZERO; 3],
                tex_coords: [Vec2::ZERO; 3],
            }; MAX_CLIPPED_TRIANGLES],
            count: 0,
        }
    }
}

impl ClipList {
    #[inline]
    pub fn clear(&mut self) {
        self.count = 0;
    }

    #[inline]
    pub fn push(&mut self, triangle: ClipTriangle) {
        if self.count < MAX_CLIPPED_TRIANGLES {
            self.triangles[self.count] = triangle;
            self.count += 1;
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[ClipTriangle] {
        &self.triangles[..self.count]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Reusable ping-pong scratch so per-triangle clipping never allocates.
#[derive(Default)]
pub struct Clipper {
    front: ClipList,
    back: ClipList,
}

impl Clipper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clip `triangle` against all six planes. The returned slice borrows the
    /// clipper's scratch and is valid until the next call.
    pub fn clip(&mut self, triangle: &ClipTriangle) -> &[ClipTriangle] {
        self.front.clear();

        // Common case: nothing to cut.
        if is_fully_inside(triangle) {
            self.front.push(*triangle);
            return self.front.as_slice();
        }

        self.front.push(*triangle);
        for plane in ClipPlane::ALL {
            self.back.clear();
            for tri in self.front.as_slice() {
                clip_against_plane(tri, plane, &mut self.back);
            }
            std::mem::swap(&mut self.front, &mut self.back);
            if self.front.is_empty() {
                break;
            }
        }

        self.front.as_slice()
    }
}

#[inline(always)]
fn is_fully_inside(triangle: &ClipTriangle) -> bool {
    triangle.positions.iter().all(|&p| {
        ClipPlane::ALL.iter().all(|plane| plane.distance(p) >= 0.0)
    })
}

#[inline(always)]
fn lerp_vertex(tri: &ClipTriangle, a: usize, b: usize, da: f32, db: f32) -> (Vec4, Vec2) {
    let t = da / (da - db);
    (
        tri.positions[a].lerp(tri.positions[b], t),
        tri.tex_coords[a].lerp(tri.tex_coords[b], t),
    )
}

/// Clip one triangle against one plane, appending 0, 1 or 2 triangles.
pub fn clip_against_plane(tri: &ClipTriangle, plane: ClipPlane, out: &mut ClipList) {
    let d = [
        plane.distance(tri.positions[0]),
        plane.distance(tri.positions[1]),
        plane.distance(tri.positions[2]),
    ];
    let inside = [d[0] >= 0.0, d[1] >= 0.0, d[2] >= 0.0];
    let inside_count = inside.iter().filter(|&&i| i).count();

    match inside_count {
        3 => out.push(*tri),
        0 => {}
        1 => {
            // Rotate so the inside vertex is `a`; (a, b, c) keeps the winding.
            let a = (0..3).find(|&i| inside[i]).unwrap_or(0);
            let b = (a + 1) % 3;
            let c = (a + 2) % 3;
            let (pb, tb) = lerp_vertex(tri, a, b, d[a], d[b]);
            let (pc, tc) = lerp_vertex(tri, a, c, d[a], d[c]);
            out.push(ClipTriangle {
                positions: [tri.positions[a], pb, pc],
                tex_coords: [tri.tex_coords[a], tb, tc],
            });
        }
        _ => {
            // Rotate so the outside vertex is `c`; a and b are inside.
            let c = (0..3).find(|&i| !inside[i]).unwrap_or(2);
            let a = (c + 1) % 3;
            let b = (c + 2) % 3;
            let (pbc, tbc) = lerp_vertex(tri, b, c, d[b], d[c]);
            let (pca, tca) = lerp_vertex(tri, c, a, d[c], d[a]);
            // Quad a, b, bc, ca.
            out.push(ClipTriangle {
                positions: [tri.positions[a], tri.positions[b], pbc],
                tex_coords: [tri.tex_coords[a], tri.tex_coords[b], tbc],
            });
            out.push(ClipTriangle {
                positions: [tri.positions[a], pbc, pca],
                tex_coords: [tri.tex_coords[a], tbc, tca],
            });
        }
    }
}
