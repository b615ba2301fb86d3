use crate::symbology::Renderer;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;
    fn title(&self) -> &str;
}

pub const POPULATION_LAYER_TITLE: &str = "全国人口基本情况";

/// The thematic polygon layer shared by the 2D and 3D views.
///
/// Both views draw the same layer; only its renderer changes with the mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethLayer {
    id: LayerId,
    title: String,
    renderer: Renderer,
}

impl ChoroplethLayer {
    pub fn new(id: LayerId, title: impl Into<String>, renderer: Renderer) -> Self {
        Self {
            id,
            title: title.into(),
            renderer,
        }
    }

    /// Population layer with the planar class-break renderer applied.
    pub fn population(id: LayerId) -> Self {
        Self::new(
            id,
            POPULATION_LAYER_TITLE,
            Renderer::ClassBreaks(crate::symbology::population_class_breaks()),
        )
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Replaces the renderer, returning the previous one.
    pub fn set_renderer(&mut self, renderer: Renderer) -> Renderer {
        std::mem::replace(&mut self.renderer, renderer)
    }
}

impl Layer for ChoroplethLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }
}
