//! Language Coach — conversational language-learning assistant.
//!
//! Learner text (typed or transcribed) is routed through a generative
//! language API, one request at a time, and shaped into grammar corrections,
//! vocabulary suggestions, conversational replies and quiz questions.
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | TOML settings and paths |
//! | [`gateway`] | HTTP transport to the proxy or the upstream API |
//! | [`dispatch`] | serialized request queue with spacing, rate ceiling and retry |
//! | [`llm`] | prompts, response normalization, single-shot coach features |
//! | [`speech`] | recognizer / synthesizer collaborator traits |
//! | [`pipeline`] | correction → vocabulary → reply → speech turn loop |
//! | [`quiz`] | multiple-choice quiz engine |

pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod llm;
pub mod pipeline;
pub mod quiz;
pub mod speech;
