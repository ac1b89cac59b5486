//! # Joystick Relay Library
//!
//! Stream a dual-joystick, two-trigger, matrix-keypad controller to remote
//! receivers over UDP.
//!
//! This library provides the sampling, change detection, frame encoding and
//! fan-out pipeline, plus the keypad matrix decoder and the ping probe.

pub mod config;
pub mod error;
pub mod frame;
pub mod hardware;
pub mod relay;
pub mod sampler;
