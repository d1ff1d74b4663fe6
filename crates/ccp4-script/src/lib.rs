//! Files generated for the CCP4 programs and the molecular viewer.

pub mod coot;
pub mod refmac;
pub mod support;
pub mod template;
pub mod viewer;

pub use coot::{render_extension_script, write_extension_script, CootScriptContext};
pub use refmac::{parameter_map, preprocess_script, refine_script, RefmacInputs, RefmacParams};
pub use template::{render, TemplateValues};
pub use viewer::{axis_bild, axis_size, scene_script, SceneVolume};
