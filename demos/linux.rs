// Polls an LTR-559 on a Linux I2C bus (e.g. a Raspberry Pi with a
// Pimoroni breakout) and prints lux and proximity twice a second.

use embedded_hal::blocking::delay::DelayMs;
use linux_embedded_hal as hal;

use ltr559::Ltr559;

fn main() {
    let i2c = hal::I2cdev::new("/dev/i2c-1").unwrap();
    let mut delay = hal::Delay;

    let mut sensor = match Ltr559::new(i2c, &mut delay) {
        Ok(sensor) => sensor,
        Err(err) => {
            println!("init failed: {}", err);
            // one retry on the same bus
            let i2c = err.release();
            delay.delay_ms(100u32);
            Ltr559::new(i2c, &mut delay).unwrap()
        }
    };

    println!(
        "part id 0x{:02X} manufacturer id 0x{:02X}",
        sensor.part_id(),
        sensor.manufacturer_id()
    );

    println!("\r\n--- DATA >>> ---");
    for _ in 0..120 {
        match sensor.update_sensor() {
            Ok(reading) => println!("{:.2} lux, proximity {}", reading.lux, reading.proximity),
            Err(e) => println!("read failed: {}", e),
        }
        delay.delay_ms(500u32);
    }
    println!("\r\n--- <<< DATA ---");

    drop(sensor.close());
}
