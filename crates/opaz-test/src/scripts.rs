//! Script plugin sources used across tests.

/// Copies its inputs to its outputs. Vendor "Acme".
///
/// Logs through the host on construction and reports parameter changes as
/// automation.
pub const ECHO_PLUG: &str = r#"
fn create(handle) {
    host_log(handle, "EchoPlug created");
    #{ handle: handle, gain: 1.0, bypass: false, program: 0, program_name: "Default" }
}

fn canDo(feature) {
    opaz::can_do(feature == "bypass" || feature == "plugAsChannelInsert")
}
fn getPlugCategory() { opaz::EFFECT }
fn getProductString() { "Echo" }
fn getProgramNameIndexed(category, index) { `Program ${index}` }
fn getVendorString() { "Acme" }

fn setBypass(bypass) { this.bypass = bypass; true }
fn string2Parameter(index, text) {
    if index != 0 { return false; }
    this.gain = opaz::clamp01(parse_float(text));
    true
}

fn getNumParams() { 1 }
fn getNumPrograms() { 1 }
fn getParameter(index) { this.gain }
fn getParameterDisplay(index) { `${this.gain}` }
fn getParameterLabel(index) { "" }
fn getParameterName(index) { "Gain" }
fn setParameter(index, value) {
    this.gain = value;
    host_automate(this.handle, index, value);
}

fn getProgram() { this.program }
fn getProgramName() { this.program_name }
fn setProgram(index) { this.program = index; }
fn setProgramName(name) { this.program_name = name; }

fn getGetTailSize() { host_block_size(this.handle) }

fn processReplacing(block) { block.copy_through(); }
fn processDoubleReplacing(block) { block.copy_through(); }
fn setProcessPrecision(precision) { true }
"#;

/// Applies its gain parameter to a copy of the input. Keeps per-instance
/// state so tests can tell instances apart.
pub const GAIN_PLUG: &str = r#"
fn create(handle) { #{ handle: handle, gain: 0.5, program: 0, name: "Half" } }

fn canDo(feature) { opaz::NO }
fn getPlugCategory() { opaz::EFFECT }
fn getProductString() { "Gain" }
fn getProgramNameIndexed(category, index) { this.name }
fn getVendorString() { "Acme" }
fn setBypass(bypass) { false }
fn string2Parameter(index, text) { false }
fn getNumParams() { 1 }
fn getNumPrograms() { 1 }
fn getParameter(index) { this.gain }
fn getParameterDisplay(index) { `${opaz::gain_to_db(this.gain)}` }
fn getParameterLabel(index) { "dB" }
fn getParameterName(index) { "Gain" }
fn getProgram() { this.program }
fn getProgramName() { this.name }
fn setParameter(index, value) { this.gain = value; }
fn setProgram(index) { this.program = index; }
fn setProgramName(name) { this.name = name; }

fn processReplacing(block) {
    block.copy_through();
    for ch in 0..block.num_outputs {
        block.scale_output(ch, this.gain);
    }
}

fn getInputProperties(index) {
    if index < 2 { opaz::pin(`Gain In ${index}`, `In${index}`, true) } else { () }
}
"#;

/// Defines only a handful of capabilities.
pub const INCOMPLETE_PLUG: &str = r#"
fn create(handle) { #{ handle: handle } }
fn getVendorString() { "Acme" }
fn getProductString() { "Incomplete" }
"#;
