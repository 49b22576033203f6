// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rebake Conversion Dispatch
//!
//! Typed converter registry with rank and fallback resolution, converter
//! capabilities for both directions, and the placement transforms applied
//! around them.

pub mod converter;
pub mod converters;
pub mod error;
pub mod registry;
pub mod settings;
pub mod transform;

pub use converter::{
    HostShape, RootToHostConverter, RootToSpeckleConverter, ToHostContext, ToHostConverter,
    ToHostRegistry, ToSpeckleContext, ToSpeckleConverter, ToSpeckleRegistry,
};
pub use converters::{register_to_host_defaults, register_to_speckle_defaults};
pub use error::{Error, RegistrationError, ResolutionError, Result};
pub use registry::{ConverterRegistry, SpeckleType, TypeTag};
pub use settings::{DetailLevel, ReferencePoint, ToHostSettings, ToSpeckleSettings};
