//! Typed views over raw attribute buffers.
//!
//! An [`Accessor`] describes where a run of elements lives inside a binary
//! buffer: byte offset, optional interleave stride, component type and
//! element dimensions. It is validated **once** against the owning buffer's
//! bounds when a view is taken; after that every read is a plain typed load,
//! with no per-element pointer arithmetic anywhere else in the engine.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::errors::{Result, RimeError};

/// Scalar component type of an accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size of one component in bytes.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

/// Number of components per accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensions {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl Dimensions {
    #[must_use]
    pub fn components(self) -> usize {
        match self {
            Dimensions::Scalar => 1,
            Dimensions::Vec2 => 2,
            Dimensions::Vec3 => 3,
            Dimensions::Vec4 => 4,
            Dimensions::Mat4 => 16,
        }
    }
}

/// Location of one attribute run inside a document buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accessor {
    /// Index of the owning buffer in [`Document::buffers`](super::Document).
    pub buffer: usize,
    /// Byte offset of element 0 (buffer-view offset + accessor offset).
    pub offset: usize,
    /// Byte distance between elements; `None` means tightly packed.
    pub stride: Option<usize>,
    /// Number of elements.
    pub count: usize,
    pub component: ComponentType,
    pub dimensions: Dimensions,
}

impl Accessor {
    /// A tightly packed accessor starting at `offset`.
    #[must_use]
    pub fn tight(
        buffer: usize,
        offset: usize,
        count: usize,
        component: ComponentType,
        dimensions: Dimensions,
    ) -> Self {
        Self {
            buffer,
            offset,
            stride: None,
            count,
            component,
            dimensions,
        }
    }

    /// Size of one element in bytes.
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.component.size() * self.dimensions.components()
    }

    /// Distance between consecutive elements in bytes.
    #[must_use]
    pub fn effective_stride(&self) -> usize {
        self.stride.unwrap_or_else(|| self.element_size())
    }

    /// Bounds-checks this accessor against its buffer and returns a typed
    /// view. This is the only place raw byte ranges are inspected.
    pub fn view<'a>(&self, buffers: &'a [Vec<u8>]) -> Result<AccessorView<'a>> {
        let data = buffers.get(self.buffer).ok_or_else(|| {
            RimeError::MalformedAsset(format!("accessor references missing buffer {}", self.buffer))
        })?;

        let stride = self.effective_stride();
        if stride < self.element_size() {
            return Err(RimeError::MalformedAsset(format!(
                "accessor stride {} smaller than element size {}",
                stride,
                self.element_size()
            )));
        }

        if self.count > 0 {
            let last_end = self.offset + (self.count - 1) * stride + self.element_size();
            if last_end > data.len() {
                return Err(RimeError::MalformedAsset(format!(
                    "accessor overruns buffer {}: needs {} bytes, buffer has {}",
                    self.buffer,
                    last_end,
                    data.len()
                )));
            }
        }

        Ok(AccessorView {
            data,
            offset: self.offset,
            stride,
            count: self.count,
            component: self.component,
            dimensions: self.dimensions,
        })
    }
}

/// A validated, strongly-typed read-only view over one attribute run.
#[derive(Debug, Clone, Copy)]
pub struct AccessorView<'a> {
    data: &'a [u8],
    offset: usize,
    stride: usize,
    count: usize,
    component: ComponentType,
    dimensions: Dimensions,
}

fn read_pod<T: bytemuck::Pod>(bytes: &[u8]) -> T {
    bytemuck::pod_read_unaligned(&bytes[..size_of::<T>()])
}

impl<'a> AccessorView<'a> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub fn component(&self) -> ComponentType {
        self.component
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    #[inline]
    fn element(&self, index: usize) -> &'a [u8] {
        debug_assert!(index < self.count, "accessor element out of range");
        let start = self.offset + index * self.stride;
        &self.data[start..]
    }

    /// Reads a scalar of any component type, widened to `f32` (how the
    /// asset container stores sampler time axes of narrow types).
    #[must_use]
    pub fn scalar_f32(&self, index: usize) -> f32 {
        let bytes = self.element(index);
        match self.component {
            ComponentType::I8 => f32::from(read_pod::<i8>(bytes)),
            ComponentType::U8 => f32::from(read_pod::<u8>(bytes)),
            ComponentType::I16 => f32::from(read_pod::<i16>(bytes)),
            ComponentType::U16 => f32::from(read_pod::<u16>(bytes)),
            ComponentType::U32 => read_pod::<u32>(bytes) as f32,
            ComponentType::F32 => read_pod::<f32>(bytes),
        }
    }

    #[must_use]
    pub fn vec2(&self, index: usize) -> Vec2 {
        debug_assert_eq!(self.component, ComponentType::F32);
        Vec2::from(read_pod::<[f32; 2]>(self.element(index)))
    }

    #[must_use]
    pub fn vec3(&self, index: usize) -> Vec3 {
        debug_assert_eq!(self.component, ComponentType::F32);
        Vec3::from(read_pod::<[f32; 3]>(self.element(index)))
    }

    #[must_use]
    pub fn vec4(&self, index: usize) -> Vec4 {
        debug_assert_eq!(self.component, ComponentType::F32);
        Vec4::from(read_pod::<[f32; 4]>(self.element(index)))
    }

    #[must_use]
    pub fn mat4(&self, index: usize) -> Mat4 {
        debug_assert_eq!(self.component, ComponentType::F32);
        Mat4::from_cols_array(&read_pod::<[f32; 16]>(self.element(index)))
    }

    /// Reads a 4-wide joint index element (`U8` or `U16` storage).
    #[must_use]
    pub fn joints(&self, index: usize) -> [u16; 4] {
        let bytes = self.element(index);
        match self.component {
            ComponentType::U16 => read_pod::<[u16; 4]>(bytes),
            _ => {
                let j = read_pod::<[u8; 4]>(bytes);
                [u16::from(j[0]), u16::from(j[1]), u16::from(j[2]), u16::from(j[3])]
            }
        }
    }

    /// Reads a triangle index (`U8`, `U16` or `U32` storage).
    #[must_use]
    pub fn index(&self, index: usize) -> u32 {
        let bytes = self.element(index);
        match self.component {
            ComponentType::U16 => u32::from(read_pod::<u16>(bytes)),
            ComponentType::U32 => read_pod::<u32>(bytes),
            _ => u32::from(read_pod::<u8>(bytes)),
        }
    }
}
