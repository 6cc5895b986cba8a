//! End-to-end scenarios covering the solver's major analysis paths: DC
//! operating point, RC/RL transient step response, LC resonance, a
//! diode-conduction DC operating point, and a balanced three-phase source.

use circsim::Circuit;
use circsim_core::IntegrationMethod;
use circsim_devices::{Capacitor, Inductor, PhaseOrder, Resistor, SwitchMosfet, ThreePhaseSource, VoltageSource};
use circsim_solver::{DcOptions, TransientParams};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn idx_nearest(time: &[f64], target: f64) -> usize {
    time.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (**a - target).abs().partial_cmp(&(**b - target).abs()).unwrap())
        .unwrap()
        .0
}

#[test]
fn scenario_1_voltage_divider_dc() {
    init();
    let mut circuit = Circuit::new();
    circuit.add_component(Box::new(VoltageSource::dc("V1", "in", "0", 10.0)));
    circuit.add_component(Box::new(Resistor::new("R1", "in", "mid", 1000.0).unwrap()));
    circuit.add_component(Box::new(Resistor::new("R2", "mid", "0", 1000.0).unwrap()));

    let result = circuit.run_dc(&DcOptions::default()).unwrap();
    assert!(result.converged);
    assert!((result.voltages["in"] - 10.0).abs() < 1e-9);
    assert!((result.voltages["mid"] - 5.0).abs() < 1e-9);
    assert!((result.currents["V1"] - (-0.005)).abs() < 1e-9);
}

#[test]
fn scenario_2_rc_charging_transient() {
    init();
    let mut circuit = Circuit::new();
    circuit.add_component(Box::new(VoltageSource::dc("V1", "in", "0", 5.0)));
    circuit.add_component(Box::new(Resistor::new("R1", "in", "cap", 1000.0).unwrap()));
    circuit.add_component(Box::new(Capacitor::new("C1", "cap", "0", 1e-6).unwrap()));

    let params = TransientParams::new(10e-6, 5e-3);
    let result = circuit.run_transient(&params, &DcOptions::default()).unwrap();

    let v = &result.node_voltages["cap"];
    let at = |t: f64| v[idx_nearest(&result.time, t)];
    assert!((at(1e-3) - 3.161).abs() / 3.161 < 0.02);
    assert!((at(2e-3) - 4.323).abs() / 4.323 < 0.02);
    assert!((at(5e-3) - 4.966).abs() / 4.966 < 0.02);
}

#[test]
fn scenario_3_rl_current_rise() {
    init();
    let mut circuit = Circuit::new();
    circuit.add_component(Box::new(VoltageSource::dc("V1", "in", "0", 1.0)));
    circuit.add_component(Box::new(Resistor::new("R1", "in", "l_node", 1.0).unwrap()));
    circuit.add_component(Box::new(Inductor::new("L1", "l_node", "0", 1e-3).unwrap()));

    let params = TransientParams::new(1e-6, 5e-3);
    let result = circuit.run_transient(&params, &DcOptions::default()).unwrap();

    let i = &result.branch_currents["L1"];
    let at = |t: f64| i[idx_nearest(&result.time, t)];
    assert!((at(3e-3) - 0.9502).abs() / 0.9502 < 0.02);
}

#[test]
fn scenario_4_lc_resonator() {
    // L=1mH, C=1uF, IC V_C=1V: f0 = 1/(2*pi*sqrt(L*C)) ~= 5.033 kHz, so the
    // 2ms run covers about 10 periods. Undamped oscillation should swing
    // V_C between roughly +1V and -1V, a peak-to-peak amplitude of 2V;
    // trapezoidal integration must preserve that amplitude to within 0.1%
    // over the whole run (backward Euler alone introduces a few percent of
    // numerical damping at this step size).
    init();
    let mut circuit = Circuit::new();
    circuit.add_component(Box::new(Inductor::new("L1", "a", "b", 1e-3).unwrap()));
    circuit.add_component(Box::new(Capacitor::with_ic("C1", "b", "0", 1e-6, 1.0).unwrap()));
    circuit.add_component(Box::new(Resistor::new("Rtiny", "a", "0", 1e9).unwrap()));

    let params = TransientParams::new(1e-6, 2e-3).with_method(IntegrationMethod::Trapezoidal);
    let result = circuit.run_transient(&params, &DcOptions::default()).unwrap();
    assert_eq!(result.info.method, IntegrationMethod::Trapezoidal);
    assert!(result.time.len() > 1000);

    let vc = &result.node_voltages["b"];
    let max = vc.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = vc.iter().cloned().fold(f64::INFINITY, f64::min);
    let peak_to_peak = max - min;
    assert!(
        (peak_to_peak - 2.0).abs() / 2.0 < 0.001,
        "expected trapezoidal peak-to-peak V_C within 0.1% of 2.0V, got {peak_to_peak}"
    );
}

#[test]
fn scenario_5_switch_mosfet_body_diode() {
    // V1 pulls node "a" to -1 V (pos terminal at ground), reverse-biasing
    // M1's body diode through R1 so it conducts: expect
    // I ~= (1 - 0.7) / (1 + 0.001) A ~= 0.2997 A.
    init();
    let mut circuit = Circuit::new();
    circuit.add_component(Box::new(VoltageSource::dc("V1", "0", "a", 1.0)));
    circuit.add_component(Box::new(Resistor::new("R1", "a", "d", 1.0).unwrap()));
    circuit.add_component(Box::new(SwitchMosfet::new("M1", "d", "0", 1e-3, 1e6, 1e-3, 1e6, 0.7)));

    let result = circuit.run_dc(&DcOptions::default()).unwrap();
    let i = result.currents["V1"];
    assert!((i.abs() - 0.2997).abs() / 0.2997 < 0.05);
}

#[test]
fn scenario_6_three_phase_wye_sums_to_zero() {
    init();
    let mut circuit = Circuit::new();
    circuit.add_component(Box::new(ThreePhaseSource::wye(
        "U1",
        230.0,
        50.0,
        PhaseOrder::Abc,
        "a",
        "b",
        "c",
        "n",
    )));
    circuit.add_component(Box::new(Resistor::new("Ra", "a", "n", 1e6).unwrap()));
    circuit.add_component(Box::new(Resistor::new("Rb", "b", "n", 1e6).unwrap()));
    circuit.add_component(Box::new(Resistor::new("Rc", "c", "n", 1e6).unwrap()));
    circuit.add_component(Box::new(Resistor::new("Rn", "n", "0", 1e6).unwrap()));

    let result = circuit.run_dc(&DcOptions::default()).unwrap();
    let va = result.voltages["a"] - result.voltages["n"];
    let vb = result.voltages["b"] - result.voltages["n"];
    let vc = result.voltages["c"] - result.voltages["n"];

    assert!(va.abs() < 1e-6);
    assert!((vb - (-162.6)).abs() < 1.0);
    assert!((vc - 162.6).abs() < 1.0);
    assert!((va + vb + vc).abs() < 1e-6);
}
