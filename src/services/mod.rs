pub mod capability_registry;
pub mod code_runner;
pub mod fallback_submitter;
pub mod output_parser;
pub mod page_fetcher;
pub mod py_literal;
pub mod question_clock;
pub mod sequence_controller;
pub mod solution_generator;
