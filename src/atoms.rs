use xcb::atoms_struct;

atoms_struct! {
    pub struct Atoms {
        pub utf8_string => b"UTF8_STRING" only_if_exists = false,
        // ICCCM hints
        pub wm_change_state => b"WM_CHANGE_STATE" only_if_exists = false,
        // Supported EWMH hints
        pub net_supported  => b"_NET_SUPPORTED" only_if_exists = false,
        pub net_active_window  => b"_NET_ACTIVE_WINDOW" only_if_exists = false,
        pub net_supporting_wm_check  => b"_NET_SUPPORTING_WM_CHECK" only_if_exists = false,
        pub net_wm_name  => b"_NET_WM_NAME" only_if_exists = false,
        // Icons
        pub net_wm_icon => b"_NET_WM_ICON" only_if_exists = false,
        pub net_wm_icon_name => b"_NET_WM_ICON_NAME" only_if_exists = false,
    }
}
