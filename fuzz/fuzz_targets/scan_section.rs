#![no_main]
use libfuzzer_sys::fuzz_target;
use privaudit::audit::{scan_section, AllowList, PolicyEngine};
use privaudit::image::{FunctionSymbol, PrivilegedRegion, Section, SymbolTable};

fuzz_target!(|data: &[u8]| {
    let section = Section::new(".text", 0x0800_0000, data.to_vec());
    let symbols: SymbolTable = [FunctionSymbol::new("vTaskDelay", 0x0800_1001, None)]
        .into_iter()
        .collect();
    let allow = AllowList::secure_apis();
    let region = PrivilegedRegion::new(0x0800_1000, 0x0800_2000);
    let policy = PolicyEngine::new(region, &symbols, &allow);
    // Any outcome is fine as long as it is an Ok or a typed error, never a panic.
    let _ = scan_section(&section, &policy, true);
});
