//! List commands implementation

/// List the transports compiled into this binary
pub fn list_transports() {
    print!("{}", si5351_session::transport_help());
    println!();
    println!("Examples:");
    println!("  si5351ctl -t linux_i2c:bus=1 status");
    println!("  si5351ctl -t linux_i2c:dev=/dev/i2c-3,addr=0x61 init");
    println!("  si5351ctl -t dummy plan 7.1M");
}
