use wgpu::{BlendComponent, BlendFactor, BlendOperation, BlendState};

/// How a batch's fragments combine with what is already in the target
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Overwrite, ignoring alpha
    None,
    #[default]
    Normal,
    Add,
    Multiply,
    Screen,
    /// Punch holes into the target using the source alpha
    Erase,
}

impl BlendMode {
    pub const ALL: [BlendMode; 6] = [
        BlendMode::None,
        BlendMode::Normal,
        BlendMode::Add,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Erase,
    ];

    /// Source & destination factors for colors stored straight or premultiplied
    pub fn factors(self, premultiplied_alpha: bool) -> (BlendFactor, BlendFactor) {
        use BlendFactor::*;

        match (self, premultiplied_alpha) {
            (BlendMode::None, _) => (One, Zero),
            (BlendMode::Normal, true) => (One, OneMinusSrcAlpha),
            (BlendMode::Normal, false) => (SrcAlpha, OneMinusSrcAlpha),
            (BlendMode::Add, true) => (One, One),
            (BlendMode::Add, false) => (SrcAlpha, One),
            (BlendMode::Multiply, true) => (Dst, OneMinusSrcAlpha),
            (BlendMode::Multiply, false) => (Dst, Zero),
            (BlendMode::Screen, true) => (One, OneMinusSrc),
            (BlendMode::Screen, false) => (SrcAlpha, One),
            (BlendMode::Erase, _) => (Zero, OneMinusSrcAlpha),
        }
    }

    /// The pipeline blend state for this mode
    pub fn blend_state(self, premultiplied_alpha: bool) -> BlendState {
        let (src_factor, dst_factor) = self.factors(premultiplied_alpha);
        let component = BlendComponent {
            src_factor,
            dst_factor,
            operation: BlendOperation::Add,
        };
        BlendState {
            color: component,
            alpha: component,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_matches_wgpu_presets() {
        assert_eq!(
            BlendMode::Normal.blend_state(true).color,
            BlendState::PREMULTIPLIED_ALPHA_BLENDING.color
        );
        assert_eq!(
            BlendMode::Normal.blend_state(false).color,
            BlendState::ALPHA_BLENDING.color
        );
        assert_eq!(BlendMode::None.blend_state(true), BlendState::REPLACE);
    }

    #[test]
    fn erase_ignores_source_color() {
        for premultiplied in [true, false] {
            let (src, dst) = BlendMode::Erase.factors(premultiplied);
            assert_eq!(src, BlendFactor::Zero);
            assert_eq!(dst, BlendFactor::OneMinusSrcAlpha);
        }
    }
}
