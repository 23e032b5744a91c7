use std::collections::{hash_map::Entry, HashMap};
use std::sync::Arc;

use imgui::{TextureId, Textures};
use vulkano::descriptor_set::{
    allocator::StandardDescriptorSetAllocator, layout::DescriptorSetLayout,
    PersistentDescriptorSet, WriteDescriptorSet,
};
use vulkano::image::ImageViewAbstract;
use vulkano::sampler::Sampler;

use crate::error::{BackendContext, RenderError};

pub type Texture = (Arc<dyn ImageViewAbstract + Send + Sync>, Arc<Sampler>);

/// Id the font atlas is registered under. Never handed out by `Textures`.
pub(crate) const FONT_TEXTURE_ID: usize = usize::MAX;

/// User textures, the font atlas, and one descriptor set per texture built on demand.
pub(crate) struct TextureRegistry {
    textures: Textures<Texture>,
    font: Texture,
    sets: HashMap<TextureId, Arc<PersistentDescriptorSet>>,
    font_set: Option<Arc<PersistentDescriptorSet>>,
}

impl TextureRegistry {
    pub fn new(font: Texture) -> Self {
        TextureRegistry {
            textures: Textures::new(),
            font,
            sets: HashMap::new(),
            font_set: None,
        }
    }

    pub fn textures(&self) -> &Textures<Texture> {
        &self.textures
    }

    /// Any texture may be replaced through the returned reference, so cached sets are dropped.
    pub fn textures_mut(&mut self) -> &mut Textures<Texture> {
        self.sets.clear();
        &mut self.textures
    }

    pub fn replace_font(&mut self, font: Texture) {
        self.font = font;
        self.font_set = None;
    }

    pub fn descriptor_set(
        &mut self,
        id: TextureId,
        layout: &Arc<DescriptorSetLayout>,
        allocator: &StandardDescriptorSetAllocator,
    ) -> Result<Arc<PersistentDescriptorSet>, RenderError> {
        if id.id() == FONT_TEXTURE_ID {
            if let Some(set) = &self.font_set {
                return Ok(Arc::clone(set));
            }
            let set = Self::build_set(&self.font, layout, allocator)?;
            self.font_set = Some(Arc::clone(&set));
            return Ok(set);
        }

        match self.sets.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let texture = self.textures.get(id).ok_or(RenderError::BadTexture(id))?;
                let set = Self::build_set(texture, layout, allocator)?;
                Ok(Arc::clone(entry.insert(set)))
            }
        }
    }

    fn build_set(
        (view, sampler): &Texture,
        layout: &Arc<DescriptorSetLayout>,
        allocator: &StandardDescriptorSetAllocator,
    ) -> Result<Arc<PersistentDescriptorSet>, RenderError> {
        let set = PersistentDescriptorSet::new(
            allocator,
            Arc::clone(layout),
            [WriteDescriptorSet::image_view_sampler(
                0,
                view.clone(),
                Arc::clone(sampler),
            )],
        )
        .backend("creating a texture descriptor set")?;
        Ok(set)
    }
}
