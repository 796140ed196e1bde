//! Human-readable rendering of device state

use si5351_core::device::OutputStates;
use si5351_core::registers::{ChannelId, DeviceStatus};
use si5351_core::synth::MultisynthPlan;

/// Describe a status register value, one line per item
pub fn status_lines(status: DeviceStatus, outputs: Option<OutputStates>) -> Vec<String> {
    let mut lines = vec![format!("Status [0x00] = 0x{:02X}", status.bits())];

    let flag = |set: bool, yes: &str, no: &str| (if set { yes } else { no }).to_string();
    lines.push(format!(
        "  SYS_INIT:  {}",
        flag(status.is_ready(), "done", "in progress")
    ));
    lines.push(format!(
        "  PLLA:      {}",
        flag(status.is_pll_a_locked(), "locked", "not locked")
    ));
    lines.push(format!(
        "  PLLB:      {}",
        flag(status.contains(DeviceStatus::LOL_B), "not locked", "locked")
    ));
    lines.push(format!(
        "  Crystal:   {}",
        flag(status.contains(DeviceStatus::LOS_XTAL), "signal lost", "ok")
    ));
    lines.push(format!(
        "  CLKIN:     {}",
        flag(status.contains(DeviceStatus::LOS_CLKIN), "signal lost", "ok")
    ));
    lines.push(format!("  Revision:  {}", status.revision()));

    if let Some(outputs) = outputs {
        for channel in ChannelId::ALL {
            lines.push(format!(
                "  {}:      {}",
                channel,
                flag(outputs.is_enabled(channel), "enabled", "disabled")
            ));
        }
    }
    lines
}

/// Confirmation for a programmed output
///
/// Mentions the real output frequency when it differs from the request,
/// as it does across the divide-by-4 band.
pub fn set_line(channel: ChannelId, freq_hz: u32, output_hz: u32) -> String {
    if output_hz == freq_hz {
        format!("{} set to {} Hz", channel, freq_hz)
    } else {
        format!(
            "{} set to {} Hz (actual output {} Hz)",
            channel, freq_hz, output_hz
        )
    }
}

/// Describe a divider plan, one line per item
pub fn plan_lines(freq_hz: u32, plan: &MultisynthPlan, output_hz: u32) -> Vec<String> {
    let d = plan.divider;
    let mut lines = vec![
        format!("{} Hz:", freq_hz),
        format!("  Output:     {} Hz", output_hz),
    ];
    if plan.divide_by_4 {
        lines.push("  MultiSynth: divide by 4".to_string());
    } else if d.b == 0 {
        lines.push(format!("  MultiSynth: {} (integer)", d.a));
    } else {
        lines.push(format!("  MultiSynth: {} + {}/{}", d.a, d.b, d.c));
    }
    lines.push(format!(
        "  R divider:  {} (code {})",
        plan.r_divider, plan.r_div_code
    ));
    lines.push(format!("  P1={} P2={} P3={}", plan.p1, plan.p2, plan.p3));
    lines.push(format!(
        "  Integer mode: {}",
        if plan.integer_mode { "yes" } else { "no" }
    ));
    let regs: Vec<String> = plan.registers().iter().map(|b| format!("{:02X}", b)).collect();
    lines.push(format!("  Registers:  {}", regs.join(" ")));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use si5351_core::synth::{self, FrequencySynthesizer};

    #[test]
    fn test_status_lines() {
        let lines = status_lines(DeviceStatus::from_raw(0x20), None);
        assert_eq!(lines[0], "Status [0x00] = 0x20");
        assert_eq!(lines[1], "  SYS_INIT:  done");
        assert_eq!(lines[2], "  PLLA:      not locked");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_plan_lines() {
        let plan = synth::plan(25_000_000).unwrap();
        let lines = plan_lines(25_000_000, &plan, 25_000_000);
        assert_eq!(lines[1], "  Output:     25000000 Hz");
        assert_eq!(lines[2], "  MultiSynth: 32 (integer)");
        assert_eq!(lines[4], "  P1=3584 P2=0 P3=1");
        assert_eq!(lines[6], "  Registers:  00 01 00 0E 00 00 00 00");
    }

    #[test]
    fn test_divide_by_4_reports_real_output() {
        let synth = FrequencySynthesizer::default();
        let plan = synth.plan(175_000_000).unwrap();
        let output = synth.output_hz(&plan);
        let lines = plan_lines(175_000_000, &plan, output);
        assert_eq!(lines[1], "  Output:     200000000 Hz");
        assert_eq!(lines[2], "  MultiSynth: divide by 4");
        assert_eq!(
            set_line(ChannelId::CLK0, 175_000_000, output),
            "CLK0 set to 175000000 Hz (actual output 200000000 Hz)"
        );
        assert_eq!(
            set_line(ChannelId::CLK1, 10_000_000, 10_000_000),
            "CLK1 set to 10000000 Hz"
        );
    }
}
