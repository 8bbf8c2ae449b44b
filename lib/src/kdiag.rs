//! Trap-frame layout and diagnostic dumps.

#[cfg(target_arch = "x86_64")]
pub use x86_64_frame::{TrapFrame, kdiag_dump_trap_frame};

#[cfg(target_arch = "x86_64")]
mod x86_64_frame {
    use crate::klog_error;

    /// Execution context saved by the trap trampolines.
    ///
    /// Field order mirrors the stub's push sequence exactly: the
    /// general-purpose registers (r15 pushed last, so lowest), the vector
    /// and error code the stub tagged on, then the hardware-pushed frame.
    #[repr(C)]
    #[derive(Clone, Copy, Debug)]
    pub struct TrapFrame {
        pub r15: u64,
        pub r14: u64,
        pub r13: u64,
        pub r12: u64,
        pub r11: u64,
        pub r10: u64,
        pub r9: u64,
        pub r8: u64,
        pub rbp: u64,
        pub rdi: u64,
        pub rsi: u64,
        pub rdx: u64,
        pub rcx: u64,
        pub rbx: u64,
        pub rax: u64,
        /// Vector number pushed by the per-vector trampoline.
        pub vector: u64,
        /// Hardware error code, or the trampoline's zero filler.
        pub error_code: u64,
        pub rip: u64,
        pub cs: u64,
        pub rflags: u64,
        pub rsp: u64,
        pub ss: u64,
    }

    impl TrapFrame {
        /// An all-zero frame, used by synthetic dispatch in tests.
        pub const fn zeroed() -> Self {
            Self {
                r15: 0,
                r14: 0,
                r13: 0,
                r12: 0,
                r11: 0,
                r10: 0,
                r9: 0,
                r8: 0,
                rbp: 0,
                rdi: 0,
                rsi: 0,
                rdx: 0,
                rcx: 0,
                rbx: 0,
                rax: 0,
                vector: 0,
                error_code: 0,
                rip: 0,
                cs: 0,
                rflags: 0,
                rsp: 0,
                ss: 0,
            }
        }

        /// A zero frame tagged with a vector, for synthetic dispatch.
        pub const fn synthetic(vector: u8) -> Self {
            let mut frame = Self::zeroed();
            frame.vector = vector as u64;
            frame
        }
    }

    /// Log the saved context of a trap at error level.
    pub fn kdiag_dump_trap_frame(frame: &TrapFrame) {
        klog_error!(
            "  rip=0x{:016x} cs=0x{:04x} rflags=0x{:08x}",
            frame.rip,
            frame.cs,
            frame.rflags
        );
        klog_error!(
            "  rsp=0x{:016x} ss=0x{:04x} err=0x{:x}",
            frame.rsp,
            frame.ss,
            frame.error_code
        );
        klog_error!(
            "  rax=0x{:016x} rbx=0x{:016x} rcx=0x{:016x}",
            frame.rax,
            frame.rbx,
            frame.rcx
        );
        klog_error!(
            "  rdx=0x{:016x} rsi=0x{:016x} rdi=0x{:016x}",
            frame.rdx,
            frame.rsi,
            frame.rdi
        );
        klog_error!(
            "  rbp=0x{:016x} r8=0x{:016x}  r9=0x{:016x}",
            frame.rbp,
            frame.r8,
            frame.r9
        );
        klog_error!(
            "  r10=0x{:016x} r11=0x{:016x} r12=0x{:016x}",
            frame.r10,
            frame.r11,
            frame.r12
        );
        klog_error!(
            "  r13=0x{:016x} r14=0x{:016x} r15=0x{:016x}",
            frame.r13,
            frame.r14,
            frame.r15
        );
    }

}
