mod sampler_tests;
mod threshold_tests;
