//! Kinetic Core
//!
//! Foundational primitives shared by the Kinetic animation crates:
//!
//! - **State Machines**: typed flat state machines with entry/exit actions
//! - **Pointer Input**: device-neutral samples for gesture tracking
//!
//! # Example
//!
//! ```rust
//! use kinetic_core::fsm::StateMachine;
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Light { Off, On }
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum Switch { Toggle }
//!
//! let mut fsm = StateMachine::builder(Light::Off)
//!     .on(Light::Off, Switch::Toggle, Light::On)
//!     .on(Light::On, Switch::Toggle, Light::Off)
//!     .build();
//!
//! assert_eq!(fsm.send(Switch::Toggle), Some(Light::On));
//! assert!(fsm.is_in(Light::On));
//! ```

pub mod fsm;
pub mod input;

pub use fsm::{StateMachine, StateMachineBuilder, Transition};
pub use input::{Axis, GestureSample, PointerEvent, PointerPhase};
