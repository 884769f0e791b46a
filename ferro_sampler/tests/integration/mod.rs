mod bad_timing;
mod deadline;
mod missed_update;
mod nominal_run;
mod saturation;
mod support;
