//! Dashboard JavaScript
//!
//! The pages work without scripting; this only adds:
//! - sidebar select submits on change
//! - submit buttons disable while the request is in flight

pub const SCRIPT: &str = r"
// ============================================================================
// Sidebar menu
// ============================================================================
const menu = document.getElementById('page');
if (menu) {
    menu.addEventListener('change', () => menu.form.submit());
}

// ============================================================================
// Submit feedback (prediction requests can take a few seconds)
// ============================================================================
document.querySelectorAll('form').forEach(form => {
    form.addEventListener('submit', () => {
        const btn = form.querySelector('button[type=submit]');
        if (btn) {
            btn.disabled = true;
            btn.textContent = '⏳ ' + btn.textContent;
        }
    });
});
";
