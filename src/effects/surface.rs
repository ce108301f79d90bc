/// An opaque drawable target owned by the rendering backend.
///
/// The scheduler only needs to bind a surface for drawing and keep its
/// dimensions current; everything else (framebuffers, textures) lives behind
/// the implementation.
pub trait Surface {
    /// Makes this surface the active draw target.
    fn activate(&mut self);

    fn update_geometry(&mut self, width: u32, height: u32);
}

/// Blends one surface onto another with source-over alpha compositing,
/// weighted by `alpha`.
pub trait Compositor<S: Surface> {
    fn composite(&mut self, source: &S, alpha: f32, output: &mut S);
}

/// Stable handle into a `SurfaceArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceId(usize);

/// Arena owning every per-activation surface.
///
/// Surfaces are referenced by index handle instead of shared ownership, so
/// two effects exchanging front/back targets swap handles rather than
/// aliasing each other's allocations. Freed slots are reused.
pub struct SurfaceArena<S> {
    slots: Vec<Option<S>>,
    free: Vec<usize>,
}

impl<S> SurfaceArena<S> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn alloc(&mut self, surface: S) -> SurfaceId {
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(surface);
                SurfaceId(index)
            }
            None => {
                self.slots.push(Some(surface));
                SurfaceId(self.slots.len() - 1)
            }
        }
    }

    /// Releases the surface behind `id`, returning it to the caller. The
    /// handle must not be used afterwards.
    pub fn free(&mut self, id: SurfaceId) -> S {
        let surface = self.slots[id.0]
            .take()
            .expect("SurfaceArena::free called on an empty slot");
        self.free.push(id.0);
        surface
    }

    pub fn get(&self, id: SurfaceId) -> &S {
        self.slots[id.0]
            .as_ref()
            .expect("SurfaceArena::get called on an empty slot")
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> &mut S {
        self.slots[id.0]
            .as_mut()
            .expect("SurfaceArena::get_mut called on an empty slot")
    }

    /// Exchanges the surfaces behind two handles. Outstanding handles keep
    /// their values; only the referenced contents move.
    pub fn swap(&mut self, a: SurfaceId, b: SurfaceId) {
        self.slots.swap(a.0, b.0);
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> Default for SurfaceArena<S> {
    fn default() -> Self {
        Self::new()
    }
}
