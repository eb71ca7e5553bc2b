//! Render-state keys, enum literal types and the constant/variable value split

use std::collections::HashMap;

use crate::keywords::Keyword;

/// Block a render-state entry is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateBlock {
    Blend,
    Depth,
    Stencil,
    Raster,
}

impl StateBlock {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::BlendState => Some(StateBlock::Blend),
            Keyword::DepthState => Some(StateBlock::Depth),
            Keyword::StencilState => Some(StateBlock::Stencil),
            Keyword::RasterState => Some(StateBlock::Raster),
            _ => None,
        }
    }

    pub fn keyword(&self) -> Keyword {
        match self {
            StateBlock::Blend => Keyword::BlendState,
            StateBlock::Depth => Keyword::DepthState,
            StateBlock::Stencil => Keyword::StencilState,
            StateBlock::Raster => Keyword::RasterState,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderStateElement {
    BlendEnabled,
    ColorBlendOperation,
    AlphaBlendOperation,
    SourceColorBlendFactor,
    DestinationColorBlendFactor,
    SourceAlphaBlendFactor,
    DestinationAlphaBlendFactor,
    ColorWriteMask,
    BlendColor,
    AlphaToCoverage,

    DepthEnabled,
    DepthWriteEnabled,
    DepthCompareFunction,

    StencilEnabled,
    StencilReferenceValue,
    StencilMask,
    StencilWriteMask,
    StencilCompareFunctionFront,
    StencilCompareFunctionBack,
    StencilPassOperationFront,
    StencilPassOperationBack,
    StencilFailOperationFront,
    StencilFailOperationBack,
    StencilZFailOperationFront,
    StencilZFailOperationBack,

    CullMode,
    DepthBias,
    SlopeScaledDepthBias,

    RenderQueueType,
}

const BLEND_KEYS: &[(&str, RenderStateElement)] = &[
    ("Enabled", RenderStateElement::BlendEnabled),
    ("ColorBlendOperation", RenderStateElement::ColorBlendOperation),
    ("AlphaBlendOperation", RenderStateElement::AlphaBlendOperation),
    ("SourceColorBlendFactor", RenderStateElement::SourceColorBlendFactor),
    ("DestinationColorBlendFactor", RenderStateElement::DestinationColorBlendFactor),
    ("SourceAlphaBlendFactor", RenderStateElement::SourceAlphaBlendFactor),
    ("DestinationAlphaBlendFactor", RenderStateElement::DestinationAlphaBlendFactor),
    ("ColorWriteMask", RenderStateElement::ColorWriteMask),
    ("BlendColor", RenderStateElement::BlendColor),
    ("AlphaToCoverage", RenderStateElement::AlphaToCoverage),
];

const DEPTH_KEYS: &[(&str, RenderStateElement)] = &[
    ("Enabled", RenderStateElement::DepthEnabled),
    ("WriteEnabled", RenderStateElement::DepthWriteEnabled),
    ("CompareFunction", RenderStateElement::DepthCompareFunction),
];

const STENCIL_KEYS: &[(&str, RenderStateElement)] = &[
    ("Enabled", RenderStateElement::StencilEnabled),
    ("ReferenceValue", RenderStateElement::StencilReferenceValue),
    ("Mask", RenderStateElement::StencilMask),
    ("WriteMask", RenderStateElement::StencilWriteMask),
    ("CompareFunctionFront", RenderStateElement::StencilCompareFunctionFront),
    ("CompareFunctionBack", RenderStateElement::StencilCompareFunctionBack),
    ("PassOperationFront", RenderStateElement::StencilPassOperationFront),
    ("PassOperationBack", RenderStateElement::StencilPassOperationBack),
    ("FailOperationFront", RenderStateElement::StencilFailOperationFront),
    ("FailOperationBack", RenderStateElement::StencilFailOperationBack),
    ("ZFailOperationFront", RenderStateElement::StencilZFailOperationFront),
    ("ZFailOperationBack", RenderStateElement::StencilZFailOperationBack),
];

const RASTER_KEYS: &[(&str, RenderStateElement)] = &[
    ("CullMode", RenderStateElement::CullMode),
    ("DepthBias", RenderStateElement::DepthBias),
    ("SlopeScaledDepthBias", RenderStateElement::SlopeScaledDepthBias),
];

impl RenderStateElement {
    /// Element named `key` inside `block`
    pub fn lookup(block: StateBlock, key: &str) -> Option<Self> {
        let keys = match block {
            StateBlock::Blend => BLEND_KEYS,
            StateBlock::Depth => DEPTH_KEYS,
            StateBlock::Stencil => STENCIL_KEYS,
            StateBlock::Raster => RASTER_KEYS,
        };
        keys.iter().find(|(name, _)| *name == key).map(|(_, e)| *e)
    }

    /// Blend keys that are set per render target
    pub fn is_per_target(&self) -> bool {
        matches!(
            self,
            RenderStateElement::BlendEnabled
                | RenderStateElement::ColorBlendOperation
                | RenderStateElement::AlphaBlendOperation
                | RenderStateElement::SourceColorBlendFactor
                | RenderStateElement::DestinationColorBlendFactor
                | RenderStateElement::SourceAlphaBlendFactor
                | RenderStateElement::DestinationAlphaBlendFactor
                | RenderStateElement::ColorWriteMask
        )
    }
}

/// Render-state element plus render target index (always 0 for non-blend keys)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderStateKey {
    pub element: RenderStateElement,
    pub target: u32,
}

impl RenderStateKey {
    pub fn new(element: RenderStateElement) -> Self {
        RenderStateKey { element, target: 0 }
    }

    pub fn with_target(element: RenderStateElement, target: u32) -> Self {
        RenderStateKey { element, target }
    }
}

/// Type prefix of an enum literal such as `CompareFunction.LessEqual`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateEnum {
    BlendFactor,
    BlendOperation,
    CompareFunction,
    StencilOperation,
    CullMode,
    RenderQueueType,
    ColorWriteMask,
}

impl StateEnum {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "BlendFactor" => Some(StateEnum::BlendFactor),
            "BlendOperation" => Some(StateEnum::BlendOperation),
            "CompareFunction" => Some(StateEnum::CompareFunction),
            "StencilOperation" => Some(StateEnum::StencilOperation),
            "CullMode" => Some(StateEnum::CullMode),
            "RenderQueueType" => Some(StateEnum::RenderQueueType),
            "ColorWriteMask" => Some(StateEnum::ColorWriteMask),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StateEnum::BlendFactor => "BlendFactor",
            StateEnum::BlendOperation => "BlendOperation",
            StateEnum::CompareFunction => "CompareFunction",
            StateEnum::StencilOperation => "StencilOperation",
            StateEnum::CullMode => "CullMode",
            StateEnum::RenderQueueType => "RenderQueueType",
            StateEnum::ColorWriteMask => "ColorWriteMask",
        }
    }

    pub fn members(&self) -> &'static [&'static str] {
        match self {
            StateEnum::BlendFactor => &[
                "Zero",
                "One",
                "SourceColor",
                "OneMinusSourceColor",
                "DestinationColor",
                "OneMinusDestinationColor",
                "SourceAlpha",
                "OneMinusSourceAlpha",
                "DestinationAlpha",
                "OneMinusDestinationAlpha",
                "SourceAlphaSaturate",
                "BlendColor",
                "OneMinusBlendColor",
            ],
            StateEnum::BlendOperation => &["Add", "Subtract", "ReverseSubtract", "Min", "Max"],
            StateEnum::CompareFunction => &[
                "Never",
                "Less",
                "Equal",
                "LessEqual",
                "Greater",
                "NotEqual",
                "GreaterEqual",
                "Always",
            ],
            StateEnum::StencilOperation => &[
                "Keep",
                "Zero",
                "Replace",
                "IncrementSaturate",
                "DecrementSaturate",
                "Invert",
                "IncrementWrap",
                "DecrementWrap",
            ],
            StateEnum::CullMode => &["Off", "Front", "Back"],
            StateEnum::RenderQueueType => &["Opaque", "AlphaTest", "Transparent"],
            StateEnum::ColorWriteMask => &["None", "Red", "Green", "Blue", "Alpha", "All"],
        }
    }

    pub fn has_member(&self, member: &str) -> bool {
        self.members().contains(&member)
    }
}

/// A value fixed at compile time
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStateConstant {
    Bool(bool),
    Number(f64),
    String(String),
    Color([f32; 4]),
    Enum(StateEnum, String),
}

/// Either a constant, or the name of a property resolved against runtime shader data
#[derive(Debug, Clone, PartialEq)]
pub enum RenderStateValue {
    Constant(RenderStateConstant),
    Variable(String),
}

/// Render-state assignments of one pass; each key lives in exactly one of the two maps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStates {
    pub constants: HashMap<RenderStateKey, RenderStateConstant>,
    pub variables: HashMap<RenderStateKey, String>,
}

impl RenderStates {
    pub fn assign(&mut self, key: RenderStateKey, value: RenderStateValue) {
        match value {
            RenderStateValue::Constant(c) => {
                self.variables.remove(&key);
                self.constants.insert(key, c);
            }
            RenderStateValue::Variable(name) => {
                self.constants.remove(&key);
                self.variables.insert(key, name);
            }
        }
    }

    pub fn get(&self, key: &RenderStateKey) -> Option<RenderStateValue> {
        if let Some(c) = self.constants.get(key) {
            return Some(RenderStateValue::Constant(c.clone()));
        }
        self.variables
            .get(key)
            .map(|v| RenderStateValue::Variable(v.clone()))
    }

    pub fn len(&self) -> usize {
        self.constants.len() + self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
