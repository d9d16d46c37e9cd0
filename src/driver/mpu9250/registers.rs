// src/driver/mpu9250/registers.rs

// MPU-9250 register map (RM-MPU-9250A-00) and the AK8963 magnetometer
// reached through I2C bypass. Only what the driver touches is listed.

// === MPU-9250 ===

pub const CONFIG: u8 = 0x1A;
pub const GYRO_CONFIG: u8 = 0x1B;
pub const ACCEL_CONFIG: u8 = 0x1C;
pub const INT_PIN_CFG: u8 = 0x37;
/// Six bytes, big-endian X/Y/Z.
pub const ACCEL_XOUT_H: u8 = 0x3B;
/// Six bytes, big-endian X/Y/Z.
pub const GYRO_XOUT_H: u8 = 0x43;
pub const PWR_MGMT_1: u8 = 0x6B;
pub const WHO_AM_I: u8 = 0x75;

/// Device address with AD0 tied low.
pub const ADDRESS_AD0_LOW: u8 = 0x68;
/// Device address with AD0 tied high.
pub const ADDRESS_AD0_HIGH: u8 = 0x69;
/// Both straps, tried in this order by the channel scan.
pub const ADDRESSES: [u8; 2] = [ADDRESS_AD0_LOW, ADDRESS_AD0_HIGH];

pub const WHO_AM_I_MPU9250: u8 = 0x71;
pub const WHO_AM_I_MPU9255: u8 = 0x73;

/// Identities accepted as an MPU-9250 class device.
pub const ACCEPTED_IDS: [u8; 2] = [WHO_AM_I_MPU9250, WHO_AM_I_MPU9255];

pub const PWR_MGMT_1_H_RESET: u8 = 0x80;
pub const PWR_MGMT_1_CLKSEL_AUTO: u8 = 0x01;
pub const INT_PIN_CFG_BYPASS_EN: u8 = 0x02;
/// 41 Hz gyro bandwidth.
pub const DLPF_CFG_41HZ: u8 = 0x03;

/// GYRO_CONFIG / ACCEL_CONFIG full-scale select, bits [4:3].
pub const FS_SEL_0: u8 = 0x00;
pub const FS_SEL_1: u8 = 0x08;
pub const FS_SEL_2: u8 = 0x10;
pub const FS_SEL_3: u8 = 0x18;

// === AK8963 ===

pub const AK8963_ADDRESS: u8 = 0x0C;

pub const AK8963_WIA: u8 = 0x00;
pub const AK8963_ST1: u8 = 0x02;
/// Six bytes little-endian X/Y/Z, then ST2. Reading ST2 releases the data
/// registers for the next sample.
pub const AK8963_HXL: u8 = 0x03;
pub const AK8963_CNTL1: u8 = 0x0A;
pub const AK8963_CNTL2: u8 = 0x0B;
/// Three bytes of sensitivity adjustment, only readable in fuse ROM mode.
pub const AK8963_ASAX: u8 = 0x10;

pub const AK8963_WIA_VALUE: u8 = 0x48;
pub const AK8963_ST1_DRDY: u8 = 0x01;
pub const AK8963_ST2_HOFL: u8 = 0x08;
pub const AK8963_CNTL2_SRST: u8 = 0x01;

pub const AK8963_MODE_POWER_DOWN: u8 = 0x00;
pub const AK8963_MODE_CONTINUOUS_8HZ: u8 = 0x02;
pub const AK8963_MODE_CONTINUOUS_100HZ: u8 = 0x06;
pub const AK8963_MODE_FUSE_ROM: u8 = 0x0F;
pub const AK8963_BIT_16: u8 = 0x10;
